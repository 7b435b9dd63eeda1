//! Component definitions.
//!
//! A component is a render function wrapped in zero or more layers. The
//! layer is an explicit [`ComponentKind`], so wrappers can tell what they are
//! given without inspecting it at runtime.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::scope::Scope;
use super::view::View;
use crate::error::HostError;
use crate::props::Props;

/// A component's render function.
pub type RenderFn<P> = Arc<dyn Fn(&P, &mut Scope<'_>) -> View + Send + Sync>;

/// Static field names that wrappers never copy from a wrapped component.
pub const RESERVED_STATICS: &[&str] = &[
    "display_name",
    "default_props",
    "prop_types",
    "context_type",
    "render",
    "compare",
    "type",
    "name",
];

/// Metadata attached to a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statics {
    /// Label used in logs and diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Any other caller-defined fields, in insertion order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, serde_json::Value>,
}

impl Statics {
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Copy every field of `other` whose name is not in `reserved`.
    ///
    /// Existing fields with the same name are overwritten. The display name
    /// is never copied.
    pub fn copy_from(&mut self, other: &Statics, reserved: &[&str]) {
        for (name, value) in &other.fields {
            if !reserved.contains(&name.as_str()) {
                self.fields.insert(name.clone(), value.clone());
            }
        }
    }
}

/// How a component renders.
pub enum ComponentKind<P: Props> {
    /// A plain render function.
    Function(RenderFn<P>),
    /// Passes the ref it receives to the inner component.
    ForwardRef(Arc<Component<P>>),
    /// Skips rendering the inner component when props are shallow-equal to
    /// the last render's.
    Memo(Arc<Component<P>>),
}

impl<P: Props> Clone for ComponentKind<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Function(render) => Self::Function(Arc::clone(render)),
            Self::ForwardRef(inner) => Self::ForwardRef(Arc::clone(inner)),
            Self::Memo(inner) => Self::Memo(Arc::clone(inner)),
        }
    }
}

impl<P: Props> fmt::Debug for ComponentKind<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function"),
            Self::ForwardRef(inner) => f.debug_tuple("ForwardRef").field(&inner.kind).finish(),
            Self::Memo(inner) => f.debug_tuple("Memo").field(&inner.kind).finish(),
        }
    }
}

/// A renderable component taking props `P`.
pub struct Component<P: Props> {
    kind: ComponentKind<P>,
    statics: Statics,
}

impl<P: Props> Component<P> {
    /// A component rendered by `render`.
    pub fn function<F>(render: F) -> Self
    where
        F: Fn(&P, &mut Scope<'_>) -> View + Send + Sync + 'static,
    {
        Self::from_kind(ComponentKind::Function(Arc::new(render)))
    }

    /// A component whose render function receives the ref passed to it,
    /// through [`Scope::forwarded_ref`].
    pub fn forward_ref<F>(render: F) -> Self
    where
        F: Fn(&P, &mut Scope<'_>) -> View + Send + Sync + 'static,
    {
        Self::forwarding(Self::function(render))
    }

    /// Wrap `inner` so it receives the ref passed to the result.
    pub(crate) fn forwarding(inner: Component<P>) -> Self {
        Self::from_kind(ComponentKind::ForwardRef(Arc::new(inner)))
    }

    /// Skip re-rendering when new props are shallow-equal to the previous.
    ///
    /// A component that forwards refs cannot be memoized this way; memoize
    /// its render function first and forward refs around the result.
    pub fn memo(self) -> Result<Self, HostError> {
        if let ComponentKind::ForwardRef(_) = self.kind {
            return Err(HostError::MemoOverForwardRef {
                component: self.label().to_owned(),
            });
        }
        Ok(Self::from_kind(ComponentKind::Memo(Arc::new(self))))
    }

    fn from_kind(kind: ComponentKind<P>) -> Self {
        Self {
            kind,
            statics: Statics::default(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.statics.display_name = Some(name.into());
        self
    }

    pub fn with_static(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.statics.insert(name, value);
        self
    }

    pub(crate) fn with_statics(mut self, statics: Statics) -> Self {
        self.statics = statics;
        self
    }

    pub fn kind(&self) -> &ComponentKind<P> {
        &self.kind
    }

    pub fn statics(&self) -> &Statics {
        &self.statics
    }

    /// The display name of this layer, or of the nearest inner layer that
    /// has one.
    pub fn display_name(&self) -> Option<&str> {
        match (&self.statics.display_name, &self.kind) {
            (Some(name), _) => Some(name.as_str()),
            (None, ComponentKind::ForwardRef(inner) | ComponentKind::Memo(inner)) => {
                inner.display_name()
            }
            (None, ComponentKind::Function(_)) => None,
        }
    }

    /// Copy the static fields of this layer and every inner one into
    /// `target`, skipping `reserved`. Outer layers win on conflicts.
    pub fn copy_statics_into(&self, target: &mut Statics, reserved: &[&str]) {
        if let ComponentKind::ForwardRef(inner) | ComponentKind::Memo(inner) = &self.kind {
            inner.copy_statics_into(target, reserved);
        }
        target.copy_from(&self.statics, reserved);
    }

    /// Display name, or `"Anonymous"`.
    pub fn label(&self) -> &str {
        self.display_name().unwrap_or("Anonymous")
    }

    pub fn forwards_ref(&self) -> bool {
        matches!(self.kind, ComponentKind::ForwardRef(_))
    }

    pub fn is_memo(&self) -> bool {
        matches!(self.kind, ComponentKind::Memo(_))
    }
}

impl<P: Props> Clone for Component<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            statics: self.statics.clone(),
        }
    }
}

impl<P: Props> fmt::Debug for Component<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind)
            .field("statics", &self.statics)
            .finish()
    }
}
