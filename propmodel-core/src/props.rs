//! Component props.
//!
//! A props type is a plain struct. [`Props`] gives it shallow equality, and
//! [`PropKey`] names one of its fields so a model can read that field on its
//! own. The [`props!`](crate::props!) macro declares both at once.

use std::fmt;
use std::marker::PhantomData;

/// A snapshot of a component's input properties.
pub trait Props: Clone + Send + Sync + 'static {
    /// One level deep equality: every declared field compares equal.
    fn shallow_eq(&self, other: &Self) -> bool;
}

impl Props for () {
    fn shallow_eq(&self, _other: &Self) -> bool {
        true
    }
}

/// Bounds for a value stored in a prop field.
pub trait PropValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T> PropValue for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// A typed handle to one field of a props type.
///
/// The name is the key of the per-key memo cache, so it must be unique
/// within `P`.
pub struct PropKey<P, T> {
    name: &'static str,
    read: fn(&P) -> &T,
    _marker: PhantomData<fn() -> (P, T)>,
}

impl<P, T> PropKey<P, T> {
    /// Describe the field called `name`, read through `read`.
    pub const fn new(name: &'static str, read: fn(&P) -> &T) -> Self {
        Self {
            name,
            read,
            _marker: PhantomData,
        }
    }

    /// The field name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Borrow the field from a snapshot.
    pub fn read<'a>(&self, props: &'a P) -> &'a T {
        (self.read)(props)
    }

    /// Copy the field out of a snapshot.
    pub fn get(&self, props: &P) -> T
    where
        T: Clone,
    {
        self.read(props).clone()
    }
}

impl<P, T> Clone for PropKey<P, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, T> Copy for PropKey<P, T> {}

impl<P, T> fmt::Debug for PropKey<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropKey").field(&self.name).finish()
    }
}

/// Declare a props struct with a [`PropKey`] constant per field.
///
/// Each field names its key constant after `=>`. Field types must implement
/// [`PropValue`].
///
/// ```rust,ignore
/// propmodel_core::props! {
///     pub struct CounterProps {
///         pub raw_value: i64 => RAW_VALUE,
///         pub label: String => LABEL,
///     }
/// }
///
/// let key = CounterProps::RAW_VALUE;
/// ```
#[macro_export]
macro_rules! props {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty => $key:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Props for $name {
            #[allow(unused_variables)]
            fn shallow_eq(&self, other: &Self) -> bool {
                true $(&& self.$field == other.$field)*
            }
        }

        impl $name {
            $(
                #[allow(dead_code)]
                pub const $key: $crate::PropKey<$name, $ty> = {
                    fn read(props: &$name) -> &$ty {
                        &props.$field
                    }
                    $crate::PropKey::new(stringify!($field), read)
                };
            )*
        }
    };
}
