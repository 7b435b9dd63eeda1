//! Reaction Implementation
//!
//! A Reaction observes whatever a tracked function reads and gets notified
//! when one of those values actually changes.
//!
//! # How Reactions Work
//!
//! 1. `track` runs a function inside a reactive context and records every
//!    signal and memo it read.
//!
//! 2. When a dependency changes, the reaction is queued. Once the current
//!    batch closes, it refreshes the memos it read; if none of them produced
//!    a new value (and no signal it read directly changed), nothing happens.
//!
//! 3. Otherwise `on_invalidate` is called. The owner decides when to track
//!    again, which is how render boundaries request a re-render.
//!
//! # Differences from Memo
//!
//! - Memos return a value; reactions do not cache anything.
//! - Memos are lazy (compute on access); reactions are checked as soon as
//!   the batch that made them stale closes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use tracing::trace;

use super::context::ReactiveContext;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use crate::graph::{DirtyState, NodeId, NodeKind};

/// A tracked observer that is told when what it read has changed.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let reaction = Reaction::new("logger", || println!("count changed"));
/// reaction.track(|| count.get());
///
/// count.set(5);  // Prints: "count changed"
/// ```
pub struct Reaction {
    inner: Arc<ReactionInner>,
}

struct ReactionInner {
    /// Human-readable label for logs.
    name: String,

    /// Called when a tracked value changed.
    on_invalidate: Box<dyn Fn() + Send + Sync>,

    /// Whether the reaction has been disposed.
    disposed: AtomicBool,

    /// Number of completed `track` calls.
    track_count: AtomicUsize,

    /// Number of `on_invalidate` calls.
    invalidation_count: AtomicUsize,

    /// Graph registration; removes the node on drop.
    handle: ReactiveHandle,
}

impl Reaction {
    /// Create a reaction that calls `on_invalidate` when a tracked value changes.
    pub fn new<F>(name: impl Into<String>, on_invalidate: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|weak: &Weak<ReactionInner>| {
            let weak: Weak<dyn Reactive> = weak.clone();
            ReactionInner {
                name: name.into(),
                on_invalidate: Box::new(on_invalidate),
                disposed: AtomicBool::new(false),
                track_count: AtomicUsize::new(0),
                invalidation_count: AtomicUsize::new(0),
                handle: Runtime::register(NodeKind::Reaction, Some(weak)),
            }
        });
        Self { inner }
    }

    /// Get the reaction's graph node.
    pub fn id(&self) -> NodeId {
        self.inner.handle.node_id()
    }

    /// The reaction's label.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Run `f`, replacing the reaction's dependencies with what it reads.
    ///
    /// A disposed reaction runs `f` without tracking.
    pub fn track<R>(&self, f: impl FnOnce() -> R) -> R {
        if self.is_disposed() {
            return f();
        }

        let node_id = self.id();
        let out = {
            let _ctx = ReactiveContext::enter(node_id);
            let out = f();
            Runtime::set_dependencies(node_id, ReactiveContext::get_dependencies());
            out
        };

        Runtime::set_dirty_state(node_id, DirtyState::Clean);
        self.inner.track_count.fetch_add(1, Ordering::SeqCst);
        out
    }

    /// Whether something read during the last `track` has changed since.
    ///
    /// Maybe-dirty reactions refresh their memo inputs to find out. A reaction
    /// that never tracked is stale.
    pub fn is_stale(&self) -> bool {
        !self.is_disposed() && Runtime::should_compute(self.id())
    }

    /// Dispose of the reaction.
    ///
    /// After disposal it keeps no dependencies and is never invalidated.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            Runtime::set_dependencies(self.id(), std::iter::empty());
            trace!(name = %self.inner.name, "reaction disposed");
        }
    }

    /// Check if the reaction has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of completed `track` calls.
    pub fn track_count(&self) -> usize {
        self.inner.track_count.load(Ordering::SeqCst)
    }

    /// Number of times `on_invalidate` was called.
    pub fn invalidation_count(&self) -> usize {
        self.inner.invalidation_count.load(Ordering::SeqCst)
    }

    /// Get the number of dependencies.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.id())
    }
}

impl Reactive for ReactionInner {
    fn node_id(&self) -> NodeId {
        self.handle.node_id()
    }

    fn refresh(&self) {}

    fn schedule(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        if Runtime::should_compute(self.node_id()) {
            trace!(name = %self.name, "reaction invalidated");
            self.invalidation_count.fetch_add(1, Ordering::SeqCst);
            (self.on_invalidate)();
        }
    }
}

impl Clone for Reaction {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.inner.name)
            .field("track_count", &self.track_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{batch, Memo, Signal};
    use std::sync::atomic::AtomicI32;

    fn counting_reaction() -> (Reaction, Arc<AtomicI32>) {
        let hits = Arc::new(AtomicI32::new(0));
        let counter = hits.clone();
        let reaction = Reaction::new("test", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (reaction, hits)
    }

    #[test]
    fn reaction_is_stale_before_first_track() {
        let (reaction, _) = counting_reaction();
        assert!(reaction.is_stale());

        reaction.track(|| ());
        assert!(!reaction.is_stale());
        assert_eq!(reaction.track_count(), 1);
    }

    #[test]
    fn reaction_invalidates_on_signal_change() {
        let signal = Signal::new(0);
        let (reaction, hits) = counting_reaction();

        let value = reaction.track(|| signal.get());
        assert_eq!(value, 0);
        assert_eq!(reaction.dependency_count(), 1);

        signal.set(1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(reaction.is_stale());

        // Still stale, so further writes do not invalidate again
        signal.set(2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        reaction.track(|| signal.get());
        signal.set(3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unchanged_memo_does_not_invalidate() {
        let signal = Signal::new(2);
        let source = signal.clone();
        let is_even = Memo::new(move || source.get() % 2 == 0);
        let (reaction, hits) = counting_reaction();

        reaction.track(|| is_even.get());

        signal.set(4);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!reaction.is_stale());

        signal.set(5);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn batch_invalidates_once() {
        let a = Signal::new(0);
        let b = Signal::new(0);
        let (reaction, hits) = counting_reaction();

        reaction.track(|| a.get() + b.get());

        batch(|| {
            a.set(1);
            b.set(1);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disposed_reaction_is_never_invalidated() {
        let signal = Signal::new(0);
        let (reaction, hits) = counting_reaction();

        reaction.track(|| signal.get());
        reaction.dispose();
        assert!(reaction.is_disposed());
        assert_eq!(reaction.dependency_count(), 0);

        signal.set(1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!reaction.is_stale());

        // Tracking after disposal does not subscribe again
        reaction.track(|| signal.get());
        assert_eq!(reaction.dependency_count(), 0);
    }
}
