//! Per-component models.
//!
//! - [`ModelBase`] and [`Model`]: an inert model with a lazily installed
//!   prop accessor and per-key comparers.
//! - [`PropsBox`]: the reactive slot holding a component's latest props.
//! - [`ModelHandle`]: creates a model over a snapshot getter and disposes it.

mod base;
mod factory;
mod snapshot;

pub use base::{Model, ModelBase, PropComparers};
pub use factory::{ModelHandle, SnapshotFn};
pub use snapshot::PropsBox;
