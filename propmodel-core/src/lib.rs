//! Propmodel Core
//!
//! Per-component models for reactive UI components. A component owns a model
//! whose derived values read the component's props; props are synchronized
//! into the model for you, and the component only re-renders when a value it
//! actually read has changed.
//!
//! # Architecture
//!
//! - `props`: props types, shallow equality and typed prop keys
//! - `model`: the model base, the props snapshot box and the model lifecycle
//! - `with_model`: wraps a render function into a model-backed component
//! - `reactive`: signals, memos, reactions and batching
//! - `graph`: the dependency graph the reactive runtime schedules over
//! - `host`: a minimal component runtime (roots, hooks, observer boundaries)
//!
//! # Example
//!
//! ```rust,ignore
//! use propmodel_core::{props, with_model, Model, ModelBase, Root, Scope, Signal, View, WithModel, Component};
//!
//! props! {
//!     pub struct CounterProps {
//!         pub raw_value: i64 => RAW_VALUE,
//!     }
//! }
//!
//! struct Counter {
//!     base: ModelBase<CounterProps>,
//!     multiplier: Signal<i64>,
//! }
//!
//! impl Model for Counter {
//!     type Props = CounterProps;
//!
//!     fn create() -> Self {
//!         Self { base: ModelBase::new(), multiplier: Signal::new(10) }
//!     }
//!
//!     fn base(&self) -> &ModelBase<CounterProps> {
//!         &self.base
//!     }
//! }
//!
//! let counter = with_model::<Counter>(Component::function(
//!     |wm: &WithModel<Counter>, _: &mut Scope<'_>| {
//!         let model = wm.model();
//!         View::text(format!("Value: {}", model.prop(CounterProps::RAW_VALUE) * model.multiplier.get()))
//!     },
//! ))?;
//!
//! let mut root = Root::new(counter);
//! root.render(CounterProps { raw_value: 10 });
//! assert_eq!(root.text(), "Value: 100");
//! ```

pub mod error;
pub mod graph;
pub mod host;
pub mod model;
pub mod props;
pub mod reactive;
pub mod with_model;

pub use error::{HostError, ModelError, WrapError};
pub use host::{observer, Component, NodeRef, Root, Scope, View};
pub use model::{Model, ModelBase, ModelHandle, PropComparers, PropsBox};
pub use props::{PropKey, PropValue, Props};
pub use reactive::{batch, Comparer, Memo, Reaction, Signal};
pub use with_model::{with_model, WithModel};
