//! Observer boundaries.
//!
//! An observer boundary renders inside a [`Reaction`]. When something it
//! read changes, the reaction requests a re-render of the instance. When the
//! instance re-renders for another reason and nothing read has changed, the
//! previous view is reused instead of running the render function again.

use parking_lot::Mutex;
use tracing::trace;

use super::component::Component;
use super::scope::{Cleanup, Scope};
use super::view::View;
use crate::error::HostError;
use crate::props::Props;
use crate::reactive::Reaction;

struct Boundary {
    reaction: Reaction,
    view: Mutex<Option<View>>,
}

/// Render `render` as an observer boundary of the current instance.
///
/// The reaction is disposed on unmount.
pub fn use_observer<F>(scope: &mut Scope<'_>, name: &str, render: F) -> View
where
    F: FnOnce(&mut Scope<'_>) -> View,
{
    let updater = scope.updater();
    let boundary = scope.use_cell(|| Boundary {
        reaction: Reaction::new(name, move || updater.request()),
        view: Mutex::new(None),
    });

    let reaction = boundary.reaction.clone();
    scope.use_mount_effect(move || Some(Box::new(move || reaction.dispose()) as Cleanup));

    if !boundary.reaction.is_stale() {
        if let Some(view) = boundary.view.lock().clone() {
            trace!(boundary = name, "observer reused previous view");
            return view;
        }
    }

    let view = boundary.reaction.track(|| render(scope));
    *boundary.view.lock() = Some(view.clone());
    view
}

/// A memoized component whose render function is an observer boundary.
pub fn observer<P, F>(name: &str, render: F) -> Result<Component<P>, HostError>
where
    P: Props,
    F: Fn(&P, &mut Scope<'_>) -> View + Send + Sync + 'static,
{
    let label = name.to_owned();
    Component::function(move |props: &P, scope: &mut Scope<'_>| {
        use_observer(scope, &label, |scope| render(props, scope))
    })
    .with_display_name(name)
    .memo()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Root;
    use crate::reactive::Signal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    crate::props! {
        struct Title {
            prefix: String => PREFIX,
        }
    }

    fn title(prefix: &str) -> Title {
        Title {
            prefix: prefix.into(),
        }
    }

    #[test]
    fn observer_rerenders_when_a_read_value_changes() {
        let count = Signal::new(1);
        let renders = Arc::new(AtomicUsize::new(0));

        let source = count.clone();
        let counter = renders.clone();
        let component = observer("Counter", move |props: &Title, _scope: &mut Scope<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            View::text(format!("{}{}", props.prefix, source.get()))
        })
        .unwrap();

        let mut root = Root::new(component);
        root.render(title("n="));
        assert_eq!(root.text(), "n=1");

        root.act(|| count.set(2));
        assert_eq!(root.text(), "n=2");
        assert_eq!(renders.load(Ordering::SeqCst), 2);

        // Same props, nothing changed
        root.render(title("n="));
        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clean_boundary_reuses_its_view() {
        let count = Signal::new(1);
        let renders = Arc::new(AtomicUsize::new(0));

        let source = count.clone();
        let counter = renders.clone();
        let component = Component::function(move |_: &Title, scope: &mut Scope<'_>| {
            use_observer(scope, "Inner", |_scope| {
                counter.fetch_add(1, Ordering::SeqCst);
                View::text(source.get().to_string())
            })
        });

        let mut root = Root::new(component);
        root.render(title("a"));
        root.render(title("b"));
        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(root.commit_count(), 2);

        root.act(|| count.set(5));
        assert_eq!(renders.load(Ordering::SeqCst), 2);
        assert_eq!(root.text(), "5");
    }

    #[test]
    fn unmount_disposes_the_reaction() {
        let count = Signal::new(1);
        let source = count.clone();
        let component = observer("Counter", move |_: &Title, _scope: &mut Scope<'_>| {
            View::text(source.get().to_string())
        })
        .unwrap();

        let mut root = Root::new(component);
        root.render(title(""));
        assert_eq!(count.subscriber_count(), 1);

        root.unmount();
        assert_eq!(count.subscriber_count(), 0);
    }
}
