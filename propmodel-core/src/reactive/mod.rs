//! Reactive Primitives
//!
//! This module implements the reactive system: signals, memos, reactions and
//! batches. These primitives back the props snapshot box, the per-key prop
//! memos and the render boundary.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as a memo or reaction), the read is
//! recorded as a dependency. When the signal's value changes, all dependents
//! are flagged.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates only when
//! one of its dependencies changes, and only when read. A pluggable comparer
//! decides whether a recomputed value counts as a change.
//!
//! ## Reactions
//!
//! A Reaction tracks what a function reads and is told when one of those
//! values really changed. Render boundaries use one to request re-renders.
//!
//! ## Batches
//!
//! `batch` groups writes into one transaction: reactions are checked once,
//! after the outermost batch closes.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to automatically
//! detect dependencies, and a thread-local dependency graph
//! ([`crate::graph`]) to propagate dirty flags.

mod comparer;
mod context;
mod memo;
mod reaction;
mod runtime;
mod signal;

pub use comparer::Comparer;
pub use context::{Dependencies, ReactiveContext};
pub use memo::Memo;
pub use reaction::Reaction;
pub use runtime::{batch, Reactive, ReactiveHandle, Runtime};
pub use signal::Signal;

pub use crate::graph::{DirtyState, NodeId};
