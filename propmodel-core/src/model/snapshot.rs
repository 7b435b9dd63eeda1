//! The props snapshot box.
//!
//! One reactive slot per component instance holding the latest props. Writes
//! that are shallow-equal to the held snapshot are dropped, so dependents
//! only see real changes.

use std::fmt;

use tracing::trace;

use crate::graph::NodeId;
use crate::props::Props;
use crate::reactive::{batch, Comparer, Signal};

/// A reactive single slot holding a props snapshot.
///
/// Clones share the slot.
pub struct PropsBox<P: Props> {
    slot: Signal<P>,
}

impl<P: Props> PropsBox<P> {
    pub fn new(props: P) -> Self {
        Self {
            slot: Signal::with_comparer(props, Comparer::shallow()),
        }
    }

    /// The current snapshot. Tracked by the running memo or reaction.
    pub fn read(&self) -> P {
        self.slot.get()
    }

    pub fn read_untracked(&self) -> P {
        self.slot.get_untracked()
    }

    /// Replace the snapshot as one transaction.
    ///
    /// Returns `false` when `props` was shallow-equal to the held snapshot.
    pub fn write(&self, props: P) -> bool {
        batch(|| self.slot.set(props))
    }

    /// Write `props` only if it differs from the held snapshot.
    ///
    /// Unlike [`write`](Self::write) this does not clone `props` when nothing
    /// changed.
    pub fn replace_if_changed(&self, props: &P) -> bool {
        let unchanged = self.slot.with_untracked(|held| held.shallow_eq(props));
        if unchanged {
            trace!(node_id = ?self.id(), "props unchanged, snapshot kept");
            return false;
        }

        trace!(node_id = ?self.id(), "props changed, snapshot written");
        self.write(props.clone())
    }

    /// Number of writes that changed the snapshot.
    pub fn revision(&self) -> u64 {
        self.slot.version()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.slot.ptr_eq(&other.slot)
    }

    pub fn id(&self) -> NodeId {
        self.slot.id()
    }
}

impl<P: Props> Clone for PropsBox<P> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<P: Props + fmt::Debug> fmt::Debug for PropsBox<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropsBox")
            .field("snapshot", &self.read_untracked())
            .field("revision", &self.revision())
            .finish()
    }
}
