//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (memo/reaction), the
//!    read is recorded as a dependency of that context.
//!
//! 2. When a signal's value changes, the runtime flags every dependent.
//!
//! 3. A write that the signal's comparer considers equal is a no-op.
//!
//! # Tracking Depth
//!
//! Signals are shallow: replacing the value notifies, mutating something
//! the value points to (through interior mutability) does not.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::comparer::Comparer;
use super::runtime::{ReactiveHandle, Runtime};
use crate::graph::{NodeId, NodeKind};

/// A reactive signal holding a value of type T.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (flags dependents)
/// count.set(5);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<SignalInner<T>>,
}

struct SignalInner<T> {
    /// The current value.
    value: RwLock<T>,

    /// Decides whether a write is a change.
    comparer: Comparer<T>,

    /// Number of effective writes.
    version: AtomicU64,

    /// Graph registration; removes the node on drop.
    handle: ReactiveHandle,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal compared with `PartialEq`.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_comparer(value, Comparer::default())
    }

    /// Create a new signal with a custom comparer.
    pub fn with_comparer(value: T, comparer: Comparer<T>) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                value: RwLock::new(value),
                comparer,
                version: AtomicU64::new(0),
                handle: Runtime::register(NodeKind::Source, None),
            }),
        }
    }

    /// Get the signal's graph node.
    pub fn id(&self) -> NodeId {
        self.inner.handle.node_id()
    }

    /// Get the current value.
    ///
    /// If called within a reactive context, this also records the signal as
    /// a dependency of the running computation.
    pub fn get(&self) -> T {
        Runtime::report_read(self.id());
        self.inner.value.read().clone()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value without tracking dependencies.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.read())
    }

    /// Set a new value and flag dependents.
    ///
    /// Returns `false` when the comparer saw no change.
    pub fn set(&self, value: T) -> bool {
        {
            let mut guard = self.inner.value.write();
            if self.inner.comparer.equals(&*guard, &value) {
                return false;
            }
            *guard = value;
        }

        let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(node_id = ?self.id(), version, "signal written");

        Runtime::source_changed(self.id());
        true
    }

    /// Update the value using a function.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&*self.inner.value.read());
        self.set(new_value)
    }

    /// Number of writes that changed the value.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Whether two handles point at the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get the number of computations reading this signal.
    pub fn subscriber_count(&self) -> usize {
        Runtime::dependent_count(self.id())
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("value", &self.get_untracked())
            .field("version", &self.version())
            .field("comparer", &self.inner.comparer)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
