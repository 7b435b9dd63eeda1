//! Error types.
//!
//! Every error here is a contract violation by the caller. Nothing is
//! retried; the operation that hit it is abandoned.

use thiserror::Error;

/// Misuse of a model's prop accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The accessor was read before `ModelHandle::create` installed it or
    /// after the handle was disposed.
    #[error(
        "model for `{props}` is not initialized: construct it through `with_model` or `ModelHandle::create` and read props only while it is mounted"
    )]
    NotInitialized {
        /// Name of the props type the model reads.
        props: &'static str,
    },

    /// A key was read with a value type other than the one its cached memo
    /// was created for.
    #[error("prop key `{key}` was read with a different value type than before")]
    KeyTypeMismatch { key: &'static str },
}

/// A component composition the host runtime cannot render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Memoization must sit beneath ref forwarding, never above it.
    #[error("cannot memoize `{component}`: it forwards refs, wrap the memoized component in forward_ref instead")]
    MemoOverForwardRef { component: String },
}

/// Failure while building a model-backed component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrapError {
    /// The render target already carries the memoization `with_model` applies.
    #[error("`{component}` is already memoized: pass the plain render function to with_model")]
    AlreadyMemoized { component: String },

    /// A ref-forwarding target whose inner layer is not a render function.
    #[error("`{component}` forwards refs to a component that is not a render function")]
    InnerNotCallable { component: String },

    #[error(transparent)]
    Host(#[from] HostError),
}
