//! Per-instance hook state.
//!
//! A [`Scope`] is handed to a render function. Hooks are identified by call
//! order, so a render function must call them in the same order every time.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::view::NodeRef;

/// Runs when the instance unmounts.
pub type Cleanup = Box<dyn FnOnce() + Send>;

pub(crate) type MountEffect = Box<dyn FnOnce() -> Option<Cleanup> + Send>;

pub(crate) type Cell = Arc<dyn Any + Send + Sync>;

/// Requests a re-render of the instance it belongs to.
///
/// Requests are coalesced until the root flushes.
#[derive(Clone, Default)]
pub struct Updater {
    requested: Arc<AtomicBool>,
}

impl Updater {
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Clear the request, returning whether there was one.
    pub(crate) fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("requested", &self.is_requested())
            .finish()
    }
}

/// Hook access for one render of one component instance.
pub struct Scope<'a> {
    cells: &'a mut Vec<Cell>,
    cursor: usize,
    first_render: bool,
    mount_effects: &'a mut Vec<MountEffect>,
    updater: &'a Updater,
    forwarded_ref: Option<&'a NodeRef>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        cells: &'a mut Vec<Cell>,
        mount_effects: &'a mut Vec<MountEffect>,
        updater: &'a Updater,
        forwarded_ref: Option<&'a NodeRef>,
        first_render: bool,
    ) -> Self {
        Self {
            cells,
            cursor: 0,
            first_render,
            mount_effects,
            updater,
            forwarded_ref,
        }
    }

    /// A value created on the first render and kept until unmount.
    ///
    /// # Panics
    ///
    /// Panics if the slot holds a different type, which means hooks were
    /// called in a different order than on the first render.
    pub fn use_cell<T, F>(&mut self, init: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let index = self.cursor;
        self.cursor += 1;

        if let Some(cell) = self.cells.get(index) {
            return match Arc::clone(cell).downcast::<T>() {
                Ok(value) => value,
                Err(_) => panic!(
                    "hook {index} changed type to `{}` between renders; hooks must be called in the same order",
                    type_name::<T>()
                ),
            };
        }

        let value = Arc::new(init());
        let cell: Cell = value.clone();
        self.cells.push(cell);
        value
    }

    /// Run `effect` after the first render is committed.
    ///
    /// The cleanup it returns runs on unmount. Later renders ignore the call.
    pub fn use_mount_effect<F>(&mut self, effect: F)
    where
        F: FnOnce() -> Option<Cleanup> + Send + 'static,
    {
        if self.first_render {
            self.mount_effects.push(Box::new(effect));
        }
    }

    /// A handle that schedules a re-render of this instance.
    pub fn updater(&self) -> Updater {
        self.updater.clone()
    }

    /// The ref passed to this component, if it forwards refs.
    pub fn forwarded_ref(&self) -> Option<&NodeRef> {
        self.forwarded_ref
    }

    /// Whether this instance has never rendered before.
    pub fn is_first_render(&self) -> bool {
        self.first_render
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("cells", &self.cells.len())
            .field("cursor", &self.cursor)
            .field("first_render", &self.first_render)
            .field("forwarded_ref", &self.forwarded_ref.is_some())
            .finish()
    }
}
