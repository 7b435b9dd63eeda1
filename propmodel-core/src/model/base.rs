//! The model base.
//!
//! A model is constructed inert. Its prop accessor only works between
//! [`ModelHandle::create`](super::ModelHandle::create) and
//! [`ModelHandle::dispose`](super::ModelHandle::dispose).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;

use super::factory::PropAccessor;
use crate::error::ModelError;
use crate::props::{PropKey, PropValue, Props};
use crate::reactive::Comparer;

/// Per-key equality comparers, fixed when the model is constructed.
///
/// Keys without an entry are compared with `PartialEq`.
pub struct PropComparers<P> {
    by_key: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    _marker: PhantomData<fn() -> P>,
}

impl<P: Props> PropComparers<P> {
    pub fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Compare values of `key` with `comparer`.
    pub fn with<T: PropValue>(mut self, key: PropKey<P, T>, comparer: Comparer<T>) -> Self {
        self.by_key.insert(key.name(), Box::new(comparer));
        self
    }

    /// The comparer configured for `key`, if any.
    pub fn get<T: PropValue>(&self, key: PropKey<P, T>) -> Option<Comparer<T>> {
        self.by_key
            .get(key.name())
            .and_then(|comparer| comparer.downcast_ref::<Comparer<T>>())
            .cloned()
    }

    /// The comparer for `key`, falling back to `PartialEq`.
    pub(crate) fn resolve<T: PropValue>(&self, key: PropKey<P, T>) -> Comparer<T> {
        self.get(key).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl<P: Props> Default for PropComparers<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for PropComparers<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_key.keys()).finish()
    }
}

/// State every model embeds: its comparers and the installed accessor.
///
/// Clones share state.
pub struct ModelBase<P: Props> {
    inner: Arc<BaseInner<P>>,
}

struct BaseInner<P: Props> {
    comparers: Arc<PropComparers<P>>,
    accessor: RwLock<Option<Arc<PropAccessor<P>>>>,
}

impl<P: Props> ModelBase<P> {
    /// A base with no custom comparers.
    pub fn new() -> Self {
        Self::with_comparers(PropComparers::new())
    }

    /// A base whose keys are compared as configured in `comparers`.
    pub fn with_comparers(comparers: PropComparers<P>) -> Self {
        Self {
            inner: Arc::new(BaseInner {
                comparers: Arc::new(comparers),
                accessor: RwLock::new(None),
            }),
        }
    }

    /// Read one prop, memoized per key and tracked by the running reaction.
    ///
    /// Fails with [`ModelError::NotInitialized`] outside the managed lifecycle.
    pub fn try_prop<T: PropValue>(&self, key: PropKey<P, T>) -> Result<T, ModelError> {
        // Clone out so the lock is not held while the memo computes
        let accessor = self.inner.accessor.read().clone();
        match accessor {
            Some(accessor) => accessor.read(key),
            None => Err(ModelError::NotInitialized {
                props: std::any::type_name::<P>(),
            }),
        }
    }

    /// Read one prop.
    ///
    /// # Panics
    ///
    /// Panics if the model is not installed. See [`try_prop`](Self::try_prop).
    pub fn prop<T: PropValue>(&self, key: PropKey<P, T>) -> T {
        match self.try_prop(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Whether the accessor is installed.
    pub fn is_initialized(&self) -> bool {
        self.inner.accessor.read().is_some()
    }

    /// Number of distinct keys that own a memo.
    pub fn tracked_keys(&self) -> usize {
        self.inner
            .accessor
            .read()
            .as_ref()
            .map_or(0, |accessor| accessor.len())
    }

    pub fn comparers(&self) -> &Arc<PropComparers<P>> {
        &self.inner.comparers
    }

    pub(crate) fn install(&self, accessor: Arc<PropAccessor<P>>) {
        *self.inner.accessor.write() = Some(accessor);
    }

    pub(crate) fn uninstall(&self) -> Option<Arc<PropAccessor<P>>> {
        self.inner.accessor.write().take()
    }
}

impl<P: Props> Default for ModelBase<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Props> Clone for ModelBase<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Props> fmt::Debug for ModelBase<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBase")
            .field("props", &std::any::type_name::<P>())
            .field("initialized", &self.is_initialized())
            .field("tracked_keys", &self.tracked_keys())
            .field("comparers", &self.inner.comparers)
            .finish()
    }
}

/// A per-component model.
///
/// `create` takes no arguments: a model exists before the first props do, so
/// everything it knows about its component comes through [`Model::prop`].
///
/// ```rust,ignore
/// struct Counter {
///     base: ModelBase<CounterProps>,
///     multiplier: Signal<i64>,
/// }
///
/// impl Model for Counter {
///     type Props = CounterProps;
///
///     fn create() -> Self {
///         Self { base: ModelBase::new(), multiplier: Signal::new(10) }
///     }
///
///     fn base(&self) -> &ModelBase<CounterProps> {
///         &self.base
///     }
/// }
///
/// impl Counter {
///     fn value(&self) -> i64 {
///         self.prop(CounterProps::RAW_VALUE) * self.multiplier.get()
///     }
/// }
/// ```
pub trait Model: Send + Sync + 'static {
    type Props: Props;

    /// Build an inert model.
    fn create() -> Self
    where
        Self: Sized;

    fn base(&self) -> &ModelBase<Self::Props>;

    /// See [`ModelBase::prop`].
    fn prop<T: PropValue>(&self, key: PropKey<Self::Props, T>) -> T
    where
        Self: Sized,
    {
        self.base().prop(key)
    }

    /// See [`ModelBase::try_prop`].
    fn try_prop<T: PropValue>(&self, key: PropKey<Self::Props, T>) -> Result<T, ModelError>
    where
        Self: Sized,
    {
        self.base().try_prop(key)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    crate::props! {
        struct Labels {
            title: String => TITLE,
            size: u32 => SIZE,
        }
    }

    #[test]
    fn uninstalled_base_fails_loudly() {
        let base = ModelBase::<Labels>::new();
        assert!(!base.is_initialized());
        assert_eq!(base.tracked_keys(), 0);

        let err = base.try_prop(Labels::TITLE).unwrap_err();
        assert!(matches!(err, ModelError::NotInitialized { .. }));
    }

    #[test]
    #[should_panic(expected = "not initialized")]
    fn prop_panics_when_uninstalled() {
        let base = ModelBase::<Labels>::new();
        base.prop(Labels::SIZE);
    }

    #[test]
    fn comparers_are_looked_up_by_key_and_type() {
        let comparers = PropComparers::<Labels>::new().with(
            Labels::TITLE,
            Comparer::new(|a: &String, b: &String| a.eq_ignore_ascii_case(b)),
        );

        assert_eq!(comparers.len(), 1);
        assert_eq!(comparers.get(Labels::TITLE).map(|c| c.name()), Some("custom"));
        assert!(comparers.get(Labels::SIZE).is_none());
        assert_eq!(comparers.resolve(Labels::SIZE).name(), "default");
    }

    #[test]
    fn clones_share_configuration() {
        let base = ModelBase::<Labels>::with_comparers(
            PropComparers::new().with(Labels::SIZE, Comparer::new(|a: &u32, b: &u32| a / 10 == b / 10)),
        );
        let clone = base.clone();
        assert!(Arc::ptr_eq(base.comparers(), clone.comparers()));
    }
}
