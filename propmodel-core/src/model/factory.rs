//! Model construction and teardown.
//!
//! [`ModelHandle::create`] builds a model and installs a [`PropAccessor`] on
//! its base. The accessor keeps one memo per key that has been read, each
//! computing its key from the current snapshot.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::base::{Model, PropComparers};
use crate::error::ModelError;
use crate::props::{PropKey, PropValue, Props};
use crate::reactive::Memo;

/// Returns the current props snapshot, tracked.
pub type SnapshotFn<P> = Arc<dyn Fn() -> P + Send + Sync>;

/// The lazy prop reader installed on a model.
pub(crate) struct PropAccessor<P: Props> {
    snapshot: SnapshotFn<P>,
    comparers: Arc<PropComparers<P>>,
    /// `Memo<T>` per key name.
    memos: Mutex<HashMap<&'static str, Box<dyn Any + Send + Sync>>>,
}

impl<P: Props> PropAccessor<P> {
    pub(crate) fn new(snapshot: SnapshotFn<P>, comparers: Arc<PropComparers<P>>) -> Self {
        Self {
            snapshot,
            comparers,
            memos: Mutex::new(HashMap::new()),
        }
    }

    /// Current value of `key`, creating its memo on first read.
    pub(crate) fn read<T: PropValue>(&self, key: PropKey<P, T>) -> Result<T, ModelError> {
        let memo = {
            let mut memos = self.memos.lock();
            let entry = memos.entry(key.name()).or_insert_with(|| {
                trace!(key = key.name(), "prop memo created");
                let snapshot = Arc::clone(&self.snapshot);
                let memo = Memo::with_comparer(
                    move || key.get(&snapshot()),
                    self.comparers.resolve(key),
                );
                Box::new(memo) as Box<dyn Any + Send + Sync>
            });
            entry
                .downcast_ref::<Memo<T>>()
                .cloned()
                .ok_or(ModelError::KeyTypeMismatch { key: key.name() })?
        };

        // The memo may read the snapshot; keep the cache unlocked meanwhile
        Ok(memo.get())
    }

    pub(crate) fn len(&self) -> usize {
        self.memos.lock().len()
    }

    /// Drop every memo.
    pub(crate) fn clear(&self) {
        let memos = std::mem::take(&mut *self.memos.lock());
        trace!(count = memos.len(), "prop memos released");
        drop(memos);
    }
}

/// A live model and the means to tear it down.
pub struct ModelHandle<M: Model> {
    model: Arc<M>,
    disposed: AtomicBool,
}

impl<M: Model> ModelHandle<M> {
    /// Build a model whose props are read from `get_snapshot`.
    ///
    /// `get_snapshot` should be a tracked read so the per-key memos follow
    /// snapshot writes.
    pub fn create<F>(get_snapshot: F) -> Self
    where
        F: Fn() -> M::Props + Send + Sync + 'static,
    {
        let model = Arc::new(M::create());
        let base = model.base();
        base.install(Arc::new(PropAccessor::new(
            Arc::new(get_snapshot),
            Arc::clone(base.comparers()),
        )));

        debug!(model = type_name::<M>(), "model created");
        Self {
            model,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    /// Uninstall the accessor and release the per-key memos.
    ///
    /// Later reads fail with [`ModelError::NotInitialized`]. Calling this
    /// again does nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            debug!(model = type_name::<M>(), "model already disposed");
            return;
        }

        if let Some(accessor) = self.model.base().uninstall() {
            accessor.clear();
        }
        debug!(model = type_name::<M>(), "model disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl<M: Model> fmt::Debug for ModelHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &type_name::<M>())
            .field("disposed", &self.is_disposed())
            .field("tracked_keys", &self.model.base().tracked_keys())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
