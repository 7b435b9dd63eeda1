//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Memos Work
//!
//! 1. On first access, the memo runs its computation and caches the result.
//!
//! 2. When accessed again, if no dependencies have changed, returns cached value.
//!
//! 3. When a signal it read changes, the memo is marked "dirty"; when a memo
//!    it read might have changed, it is marked "maybe dirty".
//!
//! 4. On next access, a maybe-dirty memo first refreshes its memo inputs.
//!    Only if one of them produced a new value does it recompute.
//!
//! 5. After recomputing, the comparer decides whether the value changed.
//!    An "equal" result keeps the old value and does not wake dependents.
//!
//! # Why This Matters
//!
//! - A signal changes
//! - 10 memos depend on it
//! - Only the memos actually accessed will recompute
//! - Memos that are never read stay dirty (no wasted work)

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use super::comparer::Comparer;
use super::context::ReactiveContext;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use crate::graph::{DirtyState, NodeId, NodeKind};

/// A cached derived value that recomputes only when dependencies change.
///
/// # Type Parameters
///
/// - `T`: The type of the computed value. Must be Clone + Send + Sync.
///
/// Clones share the same cache and graph node.
pub struct Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<MemoInner<T>>,
}

struct MemoInner<T> {
    /// The computation function.
    compute: Box<dyn Fn() -> T + Send + Sync>,

    /// Decides whether a recomputed value is a change.
    comparer: Comparer<T>,

    /// The cached value (None if never computed).
    value: RwLock<Option<T>>,

    /// Number of times the computation ran.
    compute_count: AtomicUsize,

    /// Graph registration; removes the node on drop.
    handle: ReactiveHandle,
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new memo compared with `PartialEq`.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: PartialEq,
    {
        Self::with_comparer(compute, Comparer::default())
    }

    /// Create a new memo with a custom comparer.
    pub fn with_comparer<F>(compute: F, comparer: Comparer<T>) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|weak: &Weak<MemoInner<T>>| {
            let weak: Weak<dyn Reactive> = weak.clone();
            MemoInner {
                compute: Box::new(compute),
                comparer,
                value: RwLock::new(None),
                compute_count: AtomicUsize::new(0),
                handle: Runtime::register(NodeKind::Derived, Some(weak)),
            }
        });
        Self { inner }
    }

    /// Get the memo's graph node.
    pub fn id(&self) -> NodeId {
        self.inner.handle.node_id()
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// Inside a reactive context the memo is recorded as a dependency.
    pub fn get(&self) -> T {
        Runtime::report_read(self.id());
        self.get_untracked()
    }

    /// Get the current value, recomputing if necessary, without tracking.
    pub fn get_untracked(&self) -> T {
        self.inner.refresh();
        self.inner
            .value
            .read()
            .clone()
            .expect("refreshed memo should have a value")
    }

    /// Get the current dirty state.
    pub fn state(&self) -> DirtyState {
        Runtime::dirty_state(self.id())
    }

    /// Number of times the computation ran.
    pub fn compute_count(&self) -> usize {
        self.inner.compute_count.load(Ordering::SeqCst)
    }

    /// Get the number of computations reading this memo.
    pub fn dependent_count(&self) -> usize {
        Runtime::dependent_count(self.id())
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }
}

impl<T> MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.handle.node_id()
    }

    /// Recompute the memo's value.
    ///
    /// This runs the computation function within a reactive context to
    /// track dependencies.
    fn recompute(&self) {
        let node_id = self.node_id();

        let next = {
            let _ctx = ReactiveContext::enter(node_id);
            let next = (self.compute)();
            Runtime::set_dependencies(node_id, ReactiveContext::get_dependencies());
            next
        };

        Runtime::set_dirty_state(node_id, DirtyState::Clean);
        self.compute_count.fetch_add(1, Ordering::SeqCst);

        let changed = {
            let mut slot = self.value.write();
            match slot.as_ref() {
                Some(previous) if self.comparer.equals(previous, &next) => false,
                _ => {
                    *slot = Some(next);
                    true
                }
            }
        };

        trace!(?node_id, changed, "memo recomputed");
        if changed {
            Runtime::confirm_changed(node_id);
        }
    }
}

impl<T> Reactive for MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        MemoInner::node_id(self)
    }

    fn refresh(&self) {
        if Runtime::should_compute(self.node_id()) {
            self.recompute();
        }
    }

    fn schedule(&self) {}
}

impl<T> Clone for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("has_value", &self.has_value())
            .field("compute_count", &self.compute_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
