//! Model-backed components.
//!
//! [`with_model`] turns a render function over [`WithModel`] into a component
//! taking the model's props. Each mounted instance owns one props box and one
//! model for its whole lifetime.
//!
//! # Lifecycle
//!
//! 1. First render: the box is seeded with the props, the model is created
//!    over `box.read()` and its disposal is registered for unmount.
//!
//! 2. Later renders: the props are written to the box if they are not
//!    shallow-equal to the held snapshot. Box and model keep their identity.
//!
//! 3. The target renders inside an observer boundary, so it only runs again
//!    when something it read changed.
//!
//! 4. Unmount: the model is disposed, once.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::WrapError;
use crate::host::{
    use_observer, Cleanup, Component, ComponentKind, RenderFn, Scope, Statics, View,
    RESERVED_STATICS,
};
use crate::model::{Model, ModelHandle, PropsBox};
use crate::props::{PropKey, PropValue, Props};

const WRAPPER_LABEL: &str = "WithModel";

/// What the wrapped render function receives: the snapshot box and the model.
pub struct WithModel<M: Model> {
    snapshot: PropsBox<M::Props>,
    model: Arc<M>,
}

impl<M: Model> WithModel<M> {
    /// The full props snapshot. Tracked, so the render reruns on any change.
    pub fn props(&self) -> M::Props {
        self.snapshot.read()
    }

    /// One prop, tracked on its own.
    pub fn prop<T: PropValue>(&self, key: PropKey<M::Props, T>) -> T {
        self.model.prop(key)
    }

    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    pub fn snapshot(&self) -> &PropsBox<M::Props> {
        &self.snapshot
    }
}

impl<M: Model> Clone for WithModel<M> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            model: Arc::clone(&self.model),
        }
    }
}

impl<M: Model> Props for WithModel<M> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.snapshot.ptr_eq(&other.snapshot) && Arc::ptr_eq(&self.model, &other.model)
    }
}

impl<M: Model> fmt::Debug for WithModel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithModel")
            .field("model", &type_name::<M>())
            .field("revision", &self.snapshot.revision())
            .finish()
    }
}

/// The per-instance state kept in a scope cell.
struct ModelBinding<M: Model> {
    snapshot: PropsBox<M::Props>,
    handle: ModelHandle<M>,
}

impl<M: Model> ModelBinding<M> {
    fn mount(props: &M::Props) -> Self {
        let snapshot = PropsBox::new(props.clone());
        let source = snapshot.clone();
        let handle = ModelHandle::create(move || source.read());
        Self { snapshot, handle }
    }

    fn sync(&self, props: &M::Props) -> bool {
        self.snapshot.replace_if_changed(props)
    }

    fn injected(&self) -> WithModel<M> {
        WithModel {
            snapshot: self.snapshot.clone(),
            model: Arc::clone(self.handle.model()),
        }
    }

    fn dispose(&self) {
        self.handle.dispose();
    }
}

/// Build a component that gives `target` a model of type `M`.
///
/// `target` must be a plain function component or a ref-forwarding one. The
/// result is memoized, and forwards refs if `target` does.
///
/// # Errors
///
/// [`WrapError::AlreadyMemoized`] if `target` is already memoized.
///
/// # Example
///
/// ```rust,ignore
/// let counter = with_model::<Counter>(
///     Component::function(|wm: &WithModel<Counter>, _scope: &mut Scope<'_>| {
///         View::text(format!("Value: {}", wm.model().value()))
///     })
///     .with_display_name("Counter"),
/// )?;
///
/// let mut root = Root::new(counter);
/// root.render(CounterProps { raw_value: 10 });
/// assert_eq!(root.text(), "Value: 100");
/// ```
pub fn with_model<M: Model>(
    target: Component<WithModel<M>>,
) -> Result<Component<M::Props>, WrapError> {
    let (render, forwards_ref) = render_target(&target)?;

    let label = match target.display_name() {
        Some(inner) => format!("{WRAPPER_LABEL}({inner})"),
        None => WRAPPER_LABEL.to_owned(),
    };
    let mut statics = Statics {
        display_name: Some(label.clone()),
        ..Statics::default()
    };
    target.copy_statics_into(&mut statics, RESERVED_STATICS);

    let boundary = label.clone();
    let body = move |props: &M::Props, scope: &mut Scope<'_>| -> View {
        let binding = scope.use_cell(|| ModelBinding::<M>::mount(props));

        let teardown = Arc::clone(&binding);
        scope.use_mount_effect(move || Some(Box::new(move || teardown.dispose()) as Cleanup));

        // Outside the boundary: the write must not become a dependency
        binding.sync(props);

        let injected = binding.injected();
        use_observer(scope, &boundary, |scope| render(&injected, scope))
    };

    let memoized = Component::function(body).with_display_name(label.clone()).memo()?;
    let component = if forwards_ref {
        Component::forwarding(memoized)
    } else {
        memoized
    };

    debug!(component = %label, model = type_name::<M>(), forwards_ref, "model wrapper built");
    Ok(component.with_statics(statics))
}

/// The render function of `target` and whether it forwards refs.
fn render_target<P: Props>(target: &Component<P>) -> Result<(RenderFn<P>, bool), WrapError> {
    let component = || target.label().to_owned();

    match target.kind() {
        ComponentKind::Function(render) => Ok((Arc::clone(render), false)),
        ComponentKind::ForwardRef(inner) => match inner.kind() {
            ComponentKind::Function(render) => Ok((Arc::clone(render), true)),
            ComponentKind::Memo(_) => Err(WrapError::AlreadyMemoized {
                component: component(),
            }),
            ComponentKind::ForwardRef(_) => Err(WrapError::InnerNotCallable {
                component: component(),
            }),
        },
        ComponentKind::Memo(_) => Err(WrapError::AlreadyMemoized {
            component: component(),
        }),
    }
}
