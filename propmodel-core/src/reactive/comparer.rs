//! Equality comparers.
//!
//! A comparer decides whether a new value is "the same" as the previous one.
//! Signals skip notification and memos keep their cached value (and do not
//! wake their dependents) when the comparer reports equality.

use std::fmt;
use std::sync::Arc;

use crate::props::Props;

/// A pluggable equality check for values of type `T`.
pub struct Comparer<T: ?Sized> {
    name: &'static str,
    eq: Arc<dyn Fn(&T, &T) -> bool + Send + Sync>,
}

impl<T: ?Sized + 'static> Comparer<T> {
    /// Build a comparer from a function.
    pub fn new<F>(eq: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self::named("custom", eq)
    }

    fn named<F>(name: &'static str, eq: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            eq: Arc::new(eq),
        }
    }

    /// Whether `a` and `b` count as equal.
    pub fn equals(&self, a: &T, b: &T) -> bool {
        (self.eq)(a, b)
    }

    /// A short label, for debug output.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: PartialEq + ?Sized + 'static> Default for Comparer<T> {
    /// Value equality through `PartialEq`.
    fn default() -> Self {
        Self::named("default", |a: &T, b: &T| a == b)
    }
}

impl<U: ?Sized + Send + Sync + 'static> Comparer<Arc<U>> {
    /// Pointer identity: two `Arc`s are equal only if they share an allocation.
    pub fn identity() -> Self {
        Self::named("identity", |a: &Arc<U>, b: &Arc<U>| Arc::ptr_eq(a, b))
    }
}

impl<P: Props> Comparer<P> {
    /// One level deep: compares each declared prop, not nested contents.
    pub fn shallow() -> Self {
        Self::named("shallow", |a: &P, b: &P| a.shallow_eq(b))
    }
}

impl<T: ?Sized> Clone for Comparer<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            eq: Arc::clone(&self.eq),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Comparer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Comparer").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_partial_eq() {
        let comparer = Comparer::<String>::default();
        assert!(comparer.equals(&"a".to_string(), &"a".to_string()));
        assert!(!comparer.equals(&"a".to_string(), &"b".to_string()));
        assert_eq!(comparer.name(), "default");
    }

    #[test]
    fn identity_compares_allocations() {
        let comparer = Comparer::<Arc<Vec<i32>>>::identity();
        let a = Arc::new(vec![1, 2]);
        let b = Arc::new(vec![1, 2]);

        assert!(comparer.equals(&a, &a.clone()));
        assert!(!comparer.equals(&a, &b));
    }

    #[test]
    fn custom_comparer() {
        let comparer = Comparer::new(|a: &String, b: &String| a.eq_ignore_ascii_case(b));
        assert!(comparer.equals(&"Hello".to_string(), &"HELLO".to_string()));
        assert_eq!(format!("{comparer:?}"), "Comparer(\"custom\")");
    }
}
