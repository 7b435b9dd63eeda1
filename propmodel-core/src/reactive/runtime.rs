//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! reactions. It owns the dependency graph and schedules updates when
//! signals change.
//!
//! # How It Works
//!
//! 1. When a signal, memo or reaction is created, it registers a node.
//!
//! 2. When a memo or reaction reads a value, the reactive context records
//!    the dependency; after the run the runtime replaces the node's edges.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Marks direct dependents dirty and transitive ones maybe-dirty
//!    b. Queues the reactions that went stale
//!    c. Drains the queue unless a batch is open
//!    d. Memos are lazy - they recompute on next access
//!
//! # Threading
//!
//! The graph lives in a thread-local. Reactive values are `Send + Sync`, but
//! a graph is only coherent on the thread that built it.

use std::cell::RefCell;
use std::sync::Weak;

use tracing::{trace, warn};

use super::context::ReactiveContext;
use crate::graph::{DirtyState, Node, NodeId, NodeKind, UpdateScheduler};

thread_local! {
    static SCHEDULER: RefCell<UpdateScheduler> = RefCell::new(UpdateScheduler::new());
}

/// A trait for objects the runtime calls back into.
pub trait Reactive {
    /// Get the graph node for this reactive value.
    fn node_id(&self) -> NodeId;

    /// Bring a derived value up to date, recomputing if needed.
    fn refresh(&self);

    /// A queued reaction gets a chance to run.
    fn schedule(&self);
}

/// Handle to a registered graph node.
///
/// Dropping this handle removes the node from the graph.
#[derive(Debug)]
pub struct ReactiveHandle {
    node_id: NodeId,
}

impl ReactiveHandle {
    /// The registered node.
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.node_id);
    }
}

/// The reactive runtime for the current thread.
pub struct Runtime;

impl Runtime {
    fn with<R>(f: impl FnOnce(&mut UpdateScheduler) -> R) -> R {
        SCHEDULER.with(|scheduler| f(&mut scheduler.borrow_mut()))
    }

    /// Register a node with the runtime.
    ///
    /// Returns a handle that unregisters the node when dropped.
    pub fn register(kind: NodeKind, handle: Option<Weak<dyn Reactive>>) -> ReactiveHandle {
        let node = match handle {
            Some(handle) => Node::new(kind).with_handle(handle),
            None => Node::new(kind),
        };
        let node_id = Self::with(|scheduler| scheduler.add_node(node));
        ReactiveHandle { node_id }
    }

    /// Unregister a node.
    fn unregister(node_id: NodeId) {
        // The thread-local may already be gone during thread teardown
        let _ = SCHEDULER.try_with(|scheduler| match scheduler.try_borrow_mut() {
            Ok(mut scheduler) => scheduler.remove_node(node_id),
            Err(_) => warn!(?node_id, "reactive node dropped while the scheduler was busy"),
        });
    }

    /// Record a read of `node_id` in the running computation, if any.
    pub fn report_read(node_id: NodeId) {
        ReactiveContext::track_dependency(node_id);
    }

    /// Replace the dependencies of a node after it ran.
    pub fn set_dependencies<I>(node_id: NodeId, dependencies: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        Self::with(|scheduler| scheduler.set_dependencies(node_id, dependencies));
    }

    /// Number of nodes a node currently depends on.
    pub fn dependency_count(node_id: NodeId) -> usize {
        Self::with(|scheduler| {
            scheduler
                .get_node(node_id)
                .map_or(0, |node| node.dependencies().len())
        })
    }

    /// Number of nodes that currently depend on a node.
    pub fn dependent_count(node_id: NodeId) -> usize {
        Self::with(|scheduler| {
            scheduler
                .get_node(node_id)
                .map_or(0, |node| node.dependents().len())
        })
    }

    /// Current dirty state of a node.
    pub fn dirty_state(node_id: NodeId) -> DirtyState {
        Self::with(|scheduler| scheduler.dirty_state(node_id))
    }

    /// Overwrite the dirty state of a node.
    pub fn set_dirty_state(node_id: NodeId, state: DirtyState) {
        Self::with(|scheduler| scheduler.set_dirty_state(node_id, state));
    }

    /// Notify dependents that a source changed.
    ///
    /// This is the core update propagation mechanism.
    pub fn source_changed(node_id: NodeId) {
        let touched = Self::with(|scheduler| scheduler.mark_changed(node_id));
        trace!(?node_id, stale = touched.len(), "source changed");
        Self::run_pending();
    }

    /// A derived node recomputed to a new value.
    pub fn confirm_changed(node_id: NodeId) {
        Self::with(|scheduler| scheduler.confirm_changed(node_id));
    }

    /// Decide whether a derived node or reaction must run.
    ///
    /// Maybe-dirty nodes refresh their derived inputs in read order and stop
    /// as soon as one of them reports a real change. If none did, the node is
    /// clean again without running.
    pub fn should_compute(node_id: NodeId) -> bool {
        match Self::dirty_state(node_id) {
            DirtyState::Clean => false,
            DirtyState::Dirty => true,
            DirtyState::MaybeDirty => {
                let inputs = Self::with(|scheduler| scheduler.derived_dependencies(node_id));
                for input in inputs {
                    if let Some(input) = input.upgrade() {
                        input.refresh();
                    }
                    if Self::dirty_state(node_id) == DirtyState::Dirty {
                        return true;
                    }
                }
                Self::set_dirty_state(node_id, DirtyState::Clean);
                false
            }
        }
    }

    /// Run `f` as one transaction: reactions run once, after it returns.
    pub fn batch<R>(f: impl FnOnce() -> R) -> R {
        Self::with(UpdateScheduler::begin_batch);
        let _guard = BatchGuard;
        f()
    }

    /// Whether a batch is open on this thread.
    pub fn is_batching() -> bool {
        Self::with(|scheduler| scheduler.is_batching())
    }

    /// Check every queued reaction, unless a batch or a drain is in progress.
    fn run_pending() {
        if !Self::with(UpdateScheduler::begin_flush) {
            return;
        }
        let _guard = FlushGuard;

        while let Some((node_id, handle)) = Self::with(UpdateScheduler::take_pending) {
            match handle.and_then(|handle| handle.upgrade()) {
                Some(reaction) => reaction.schedule(),
                None => trace!(?node_id, "skipping dropped reaction"),
            }
        }
    }

    /// Number of live nodes on this thread.
    pub fn node_count() -> usize {
        Self::with(|scheduler| scheduler.node_count())
    }
}

/// Run `f` as one transaction. See [`Runtime::batch`].
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    Runtime::batch(f)
}

struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let outermost = Runtime::with(UpdateScheduler::end_batch);
        if outermost && !std::thread::panicking() {
            Runtime::run_pending();
        }
    }
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        Runtime::with(UpdateScheduler::end_flush);
    }
}
