//! A minimal UI host runtime.
//!
//! Just enough of a component runtime to mount model-backed components:
//!
//! - `component`: function components, ref forwarding and props memoization
//! - `scope`: per-instance cells, mount effects and update requests
//! - `observer`: render boundaries that follow reactive reads
//! - `root`: mounts one instance and drives render, commit and unmount
//! - `view`: render output, committed host nodes and node refs

mod component;
mod observer;
mod root;
mod scope;
mod view;

pub use component::{Component, ComponentKind, RenderFn, Statics, RESERVED_STATICS};
pub use observer::{observer, use_observer};
pub use root::Root;
pub use scope::{Cleanup, Scope, Updater};
pub use view::{ElementView, HostNode, NodeRef, View};
