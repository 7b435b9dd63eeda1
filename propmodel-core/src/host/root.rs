//! The render root.
//!
//! A [`Root`] mounts one component instance and drives its lifecycle:
//! render with props, commit the output, run mount effects, re-render on
//! request and tear down on unmount.
//!
//! # Render Pass
//!
//! 1. Layers are walked outside in. A memo layer stops the pass when the
//!    props are shallow-equal to the ones it last rendered with, unless the
//!    instance requested an update itself.
//!
//! 2. The render function runs with a [`Scope`] over the instance's cells.
//!
//! 3. The view is committed: refs attached by the previous commit are
//!    cleared, the new host tree is built and new refs attached.
//!
//! 4. Mount effects registered by the first render run, in order.

use tracing::{debug, trace, warn};

use super::component::{Component, ComponentKind};
use super::scope::{Cell, Cleanup, MountEffect, Scope, Updater};
use super::view::{commit, HostNode, NodeRef, View};
use crate::props::Props;

/// Mounts a single component instance.
pub struct Root<P: Props> {
    component: Component<P>,
    node_ref: Option<NodeRef>,
    props: Option<P>,
    instance: Option<Instance<P>>,
    output: Option<HostNode>,
}

/// State of the mounted instance.
struct Instance<P> {
    cells: Vec<Cell>,
    /// Props last rendered through each memo layer, by depth.
    memo_props: Vec<Option<P>>,
    cleanups: Vec<Cleanup>,
    attached: Vec<NodeRef>,
    updater: Updater,
    commits: usize,
}

impl<P> Instance<P> {
    fn new() -> Self {
        Self {
            cells: Vec::new(),
            memo_props: Vec::new(),
            cleanups: Vec::new(),
            attached: Vec::new(),
            updater: Updater::default(),
            commits: 0,
        }
    }
}

/// Inputs of one render pass that stay fixed while walking the layers.
struct Pass<'a> {
    node_ref: Option<&'a NodeRef>,
    first_render: bool,
    forced: bool,
}

impl<P: Props> Root<P> {
    pub fn new(component: Component<P>) -> Self {
        Self {
            component,
            node_ref: None,
            props: None,
            instance: None,
            output: None,
        }
    }

    /// Pass `node_ref` to the component, as a parent would.
    pub fn with_ref(mut self, node_ref: NodeRef) -> Self {
        self.node_ref = Some(node_ref);
        self
    }

    /// Render with new props, mounting on the first call.
    ///
    /// Returns `false` when a memo layer skipped the render.
    pub fn render(&mut self, props: P) -> bool {
        self.props = Some(props);
        self.perform(false)
    }

    /// Re-render if the instance requested it.
    pub fn flush(&mut self) -> bool {
        let requested = self
            .instance
            .as_ref()
            .is_some_and(|instance| instance.updater.is_requested());
        requested && self.perform(true)
    }

    /// Run `f`, then flush any re-render it caused.
    pub fn act<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let out = f();
        self.flush();
        out
    }

    /// Tear the instance down: run cleanups in reverse and detach refs.
    pub fn unmount(&mut self) {
        let Some(mut instance) = self.instance.take() else {
            return;
        };

        while let Some(cleanup) = instance.cleanups.pop() {
            cleanup();
        }
        for node_ref in instance.attached.drain(..) {
            node_ref.clear();
        }
        self.output = None;
        debug!(component = self.component.label(), "component unmounted");
    }

    /// The committed host tree.
    pub fn output(&self) -> Option<&HostNode> {
        self.output.as_ref()
    }

    /// Text content of the committed tree.
    pub fn text(&self) -> String {
        self.output
            .as_ref()
            .map(HostNode::text_content)
            .unwrap_or_default()
    }

    pub fn is_mounted(&self) -> bool {
        self.instance.is_some()
    }

    /// Number of commits since mount.
    pub fn commit_count(&self) -> usize {
        self.instance.as_ref().map_or(0, |instance| instance.commits)
    }

    fn perform(&mut self, forced: bool) -> bool {
        let Some(props) = self.props.as_ref() else {
            return false;
        };

        // A first render is kept local until it returns, so a panic leaves
        // nothing half-mounted.
        let first_render = self.instance.is_none();
        let mut fresh = None;
        let instance = match self.instance.as_mut() {
            Some(instance) => instance,
            None => fresh.insert(Instance::new()),
        };
        let pass = Pass {
            node_ref: self.node_ref.as_ref(),
            first_render,
            forced: forced || instance.updater.is_requested(),
        };

        let mut effects = Vec::new();
        let Some(view) = render_layer(&self.component, props, 0, false, &pass, instance, &mut effects)
        else {
            trace!(component = self.component.label(), "render skipped by memo");
            if let Some(mounted) = fresh {
                self.instance = Some(mounted);
            }
            return false;
        };

        instance.updater.take();
        instance.commits += 1;

        for node_ref in instance.attached.drain(..) {
            node_ref.clear();
        }
        let mut attached = Vec::new();
        self.output = commit(&view, &mut attached);
        instance.attached = attached;

        for effect in effects {
            if let Some(cleanup) = effect() {
                instance.cleanups.push(cleanup);
            }
        }

        if let Some(mounted) = fresh {
            self.instance = Some(mounted);
        }
        true
    }
}

/// Render `component` and the layers beneath it.
///
/// Returns `None` when a memo layer skipped the render.
fn render_layer<P: Props>(
    component: &Component<P>,
    props: &P,
    depth: usize,
    forwarded: bool,
    pass: &Pass<'_>,
    instance: &mut Instance<P>,
    effects: &mut Vec<MountEffect>,
) -> Option<View> {
    match component.kind() {
        ComponentKind::Function(render) => {
            if pass.first_render && pass.node_ref.is_some() && !forwarded {
                warn!(
                    component = component.label(),
                    "ref passed to a component that does not forward refs"
                );
            }
            let forwarded_ref = if forwarded { pass.node_ref } else { None };
            let mut scope = Scope::new(
                &mut instance.cells,
                effects,
                &instance.updater,
                forwarded_ref,
                pass.first_render,
            );
            Some(render(props, &mut scope))
        }
        ComponentKind::ForwardRef(inner) => {
            render_layer(inner, props, depth, true, pass, instance, effects)
        }
        ComponentKind::Memo(inner) => {
            if instance.memo_props.len() <= depth {
                instance.memo_props.resize_with(depth + 1, || None);
            }
            let unchanged = instance.memo_props[depth]
                .as_ref()
                .is_some_and(|previous| previous.shallow_eq(props));
            if unchanged && !pass.forced {
                return None;
            }
            instance.memo_props[depth] = Some(props.clone());
            render_layer(inner, props, depth + 1, forwarded, pass, instance, effects)
        }
    }
}

impl<P: Props> Drop for Root<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<P: Props> std::fmt::Debug for Root<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root")
            .field("component", &self.component.label())
            .field("mounted", &self.is_mounted())
            .field("commits", &self.commit_count())
            .field("output", &self.output)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
