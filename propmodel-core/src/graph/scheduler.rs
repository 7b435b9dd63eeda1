//! Update Scheduler
//!
//! The scheduler owns the dependency graph and decides which nodes become
//! stale when a source changes.
//!
//! # Algorithm
//!
//! We use a push-pull scheme:
//!
//! 1. When a source changes, its direct dependents become `Dirty`.
//! 2. Dependents of a derived node that just left the clean state become
//!    `MaybeDirty`, recursively.
//! 3. Reactions that leave the clean state are queued.
//! 4. Nothing recomputes here. Derived nodes pull on read, and a queued
//!    reaction checks its derived inputs before it decides to run.
//! 5. When a derived node recomputes to a different value, its
//!    `MaybeDirty` dependents are confirmed as `Dirty`.
//!
//! Pushing only flags keeps writes cheap and recomputation lazy.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Weak;

use super::node::{DirtyState, Node, NodeId, NodeKind};
use crate::reactive::Reactive;

/// The update scheduler manages the dependency graph and coordinates updates.
pub struct UpdateScheduler {
    /// All nodes in the graph, indexed by ID.
    nodes: HashMap<NodeId, Node>,

    /// Reactions waiting to be checked, in the order they went stale.
    pending: VecDeque<NodeId>,

    /// Nesting depth of open batches.
    batch_depth: usize,

    /// Whether the pending queue is currently being drained.
    flushing: bool,
}

impl UpdateScheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            pending: VecDeque::new(),
            batch_depth: 0,
            flushing: false,
        }
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node from the graph.
    ///
    /// Also removes all edges involving this node.
    pub fn remove_node(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.remove(&node_id) {
            // Remove this node from its dependencies' dependent lists
            for dep_id in node.dependencies() {
                if let Some(dep) = self.nodes.get_mut(dep_id) {
                    dep.remove_dependent(node_id);
                }
            }

            // Remove this node from its dependents' dependency lists
            for dependent_id in node.dependents() {
                if let Some(dependent) = self.nodes.get_mut(dependent_id) {
                    dependent.remove_dependency(node_id);
                }
            }
        }
        self.pending.retain(|id| *id != node_id);
    }

    /// Get a reference to a node.
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable reference to a node.
    pub fn get_node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Add a dependency edge: `dependent` depends on `dependency`.
    ///
    /// This means when `dependency` changes, `dependent` may need to update.
    pub fn add_edge(&mut self, dependency: NodeId, dependent: NodeId) {
        if let Some(dep_node) = self.nodes.get_mut(&dependency) {
            dep_node.add_dependent(dependent);
        }
        if let Some(dependent_node) = self.nodes.get_mut(&dependent) {
            dependent_node.add_dependency(dependency);
        }
    }

    /// Remove a dependency edge.
    pub fn remove_edge(&mut self, dependency: NodeId, dependent: NodeId) {
        if let Some(dep_node) = self.nodes.get_mut(&dependency) {
            dep_node.remove_dependent(dependent);
        }
        if let Some(dependent_node) = self.nodes.get_mut(&dependent) {
            dependent_node.remove_dependency(dependency);
        }
    }

    /// Replace every dependency of `dependent` with `dependencies`.
    ///
    /// Called after a computation ran, with the nodes it read this time.
    pub fn set_dependencies<I>(&mut self, dependent: NodeId, dependencies: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let previous: Vec<NodeId> = match self.nodes.get_mut(&dependent) {
            Some(node) => {
                let previous = node.dependencies().iter().copied().collect();
                node.clear_dependencies();
                previous
            }
            None => return,
        };

        for dep_id in previous {
            if let Some(dep) = self.nodes.get_mut(&dep_id) {
                dep.remove_dependent(dependent);
            }
        }

        for dep_id in dependencies {
            if dep_id != dependent && self.nodes.contains_key(&dep_id) {
                self.add_edge(dep_id, dependent);
            }
        }
    }

    /// Dirty state of a node. Unknown nodes report `Dirty`.
    pub fn dirty_state(&self, node_id: NodeId) -> DirtyState {
        self.nodes
            .get(&node_id)
            .map(Node::dirty_state)
            .unwrap_or(DirtyState::Dirty)
    }

    /// Overwrite the dirty state of a node.
    pub fn set_dirty_state(&mut self, node_id: NodeId, state: DirtyState) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.set_dirty_state(state);
        }
    }

    /// Callback handles of the derived nodes `node_id` depends on, in read order.
    pub fn derived_dependencies(&self, node_id: NodeId) -> Vec<Weak<dyn Reactive>> {
        let Some(node) = self.nodes.get(&node_id) else {
            return Vec::new();
        };

        node.dependencies()
            .iter()
            .filter_map(|dep_id| self.nodes.get(dep_id))
            .filter(|dep| dep.kind() == NodeKind::Derived)
            .filter_map(|dep| dep.handle().cloned())
            .collect()
    }

    /// Mark a source node as changed and propagate dirty flags.
    ///
    /// Reactions that leave the clean state are queued. Returns the IDs of
    /// every node whose state was raised.
    pub fn mark_changed(&mut self, source_id: NodeId) -> Vec<NodeId> {
        let mut touched = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        // Direct dependents of the source are definitely dirty
        if let Some(source) = self.nodes.get(&source_id) {
            for dependent_id in source.dependents() {
                queue.push_back((*dependent_id, DirtyState::Dirty));
            }
        }

        while let Some((node_id, level)) = queue.pop_front() {
            let Some(node) = self.nodes.get_mut(&node_id) else {
                continue;
            };

            let was = node.dirty_state();
            if was >= level {
                continue;
            }
            node.set_dirty_state(level);
            touched.push(node_id);

            // A node that was already stale has already told its dependents
            if was != DirtyState::Clean {
                continue;
            }

            match node.kind() {
                NodeKind::Derived => {
                    for dependent_id in node.dependents() {
                        if visited.insert(*dependent_id) {
                            queue.push_back((*dependent_id, DirtyState::MaybeDirty));
                        }
                    }
                }
                NodeKind::Reaction => self.pending.push_back(node_id),
                NodeKind::Source => {}
            }
        }

        touched
    }

    /// A derived node recomputed to a new value: confirm its maybe-dirty
    /// dependents as dirty.
    pub fn confirm_changed(&mut self, derived_id: NodeId) {
        let dependents: Vec<NodeId> = match self.nodes.get(&derived_id) {
            Some(node) => node.dependents().iter().copied().collect(),
            None => return,
        };

        for dependent_id in dependents {
            if let Some(node) = self.nodes.get_mut(&dependent_id) {
                if node.dirty_state() == DirtyState::MaybeDirty {
                    node.mark_dirty();
                }
            }
        }
    }

    /// Open a batch.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a batch. Returns `true` when the outermost batch closed.
    pub fn end_batch(&mut self) -> bool {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        self.batch_depth == 0
    }

    /// Whether a batch is open.
    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Try to start draining the pending queue.
    ///
    /// Returns `false` inside a batch or when a drain is already running.
    pub fn begin_flush(&mut self) -> bool {
        if self.batch_depth > 0 || self.flushing {
            return false;
        }
        self.flushing = true;
        true
    }

    /// Finish draining the pending queue.
    pub fn end_flush(&mut self) {
        self.flushing = false;
    }

    /// Pop the next pending reaction along with its callback handle.
    pub fn take_pending(&mut self) -> Option<(NodeId, Option<Weak<dyn Reactive>>)> {
        let node_id = self.pending.pop_front()?;
        let handle = self.nodes.get(&node_id).and_then(|node| node.handle().cloned());
        Some((node_id, handle))
    }

    /// Number of reactions waiting to be checked.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(scheduler: &mut UpdateScheduler, ids: &[NodeId]) {
        for id in ids {
            scheduler.get_node_mut(*id).unwrap().mark_clean();
        }
    }

    #[test]
    fn add_and_remove_nodes() {
        let mut scheduler = UpdateScheduler::new();

        let id1 = scheduler.add_node(Node::source());
        let id2 = scheduler.add_node(Node::derived());

        assert_eq!(scheduler.node_count(), 2);

        scheduler.remove_node(id1);
        assert_eq!(scheduler.node_count(), 1);
        assert!(scheduler.get_node(id1).is_none());
        assert!(scheduler.get_node(id2).is_some());
    }

    #[test]
    fn add_and_remove_edges() {
        let mut scheduler = UpdateScheduler::new();

        let source_id = scheduler.add_node(Node::source());
        let derived_id = scheduler.add_node(Node::derived());

        scheduler.add_edge(source_id, derived_id);

        assert!(scheduler
            .get_node(source_id)
            .unwrap()
            .dependents()
            .contains(&derived_id));
        assert!(scheduler
            .get_node(derived_id)
            .unwrap()
            .dependencies()
            .contains(&source_id));

        scheduler.remove_edge(source_id, derived_id);

        assert!(!scheduler
            .get_node(source_id)
            .unwrap()
            .dependents()
            .contains(&derived_id));
        assert!(!scheduler
            .get_node(derived_id)
            .unwrap()
            .dependencies()
            .contains(&source_id));
    }

    #[test]
    fn set_dependencies_replaces_old_edges() {
        let mut scheduler = UpdateScheduler::new();

        let a = scheduler.add_node(Node::source());
        let b = scheduler.add_node(Node::source());
        let derived = scheduler.add_node(Node::derived());

        scheduler.set_dependencies(derived, [a]);
        scheduler.set_dependencies(derived, [b]);

        assert!(scheduler.get_node(a).unwrap().dependents().is_empty());
        assert!(scheduler.get_node(b).unwrap().dependents().contains(&derived));
    }

    #[test]
    fn mark_changed_propagates() {
        let mut scheduler = UpdateScheduler::new();

        // source -> derived1 -> derived2 -> reaction
        let source_id = scheduler.add_node(Node::source());
        let derived1_id = scheduler.add_node(Node::derived());
        let derived2_id = scheduler.add_node(Node::derived());
        let reaction_id = scheduler.add_node(Node::reaction());

        scheduler.add_edge(source_id, derived1_id);
        scheduler.add_edge(derived1_id, derived2_id);
        scheduler.add_edge(derived2_id, reaction_id);
        clean(&mut scheduler, &[derived1_id, derived2_id, reaction_id]);

        let touched = scheduler.mark_changed(source_id);

        assert_eq!(touched, vec![derived1_id, derived2_id, reaction_id]);
        assert_eq!(scheduler.dirty_state(derived1_id), DirtyState::Dirty);
        assert_eq!(scheduler.dirty_state(derived2_id), DirtyState::MaybeDirty);
        assert_eq!(scheduler.dirty_state(reaction_id), DirtyState::MaybeDirty);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn stale_reactions_are_queued_once() {
        let mut scheduler = UpdateScheduler::new();

        let source_id = scheduler.add_node(Node::source());
        let reaction_id = scheduler.add_node(Node::reaction());
        scheduler.add_edge(source_id, reaction_id);
        clean(&mut scheduler, &[reaction_id]);

        scheduler.mark_changed(source_id);
        scheduler.mark_changed(source_id);

        assert_eq!(scheduler.pending_count(), 1);
        let (next, handle) = scheduler.take_pending().unwrap();
        assert_eq!(next, reaction_id);
        assert!(handle.is_none());
        assert!(scheduler.take_pending().is_none());
    }

    #[test]
    fn confirm_changed_upgrades_maybe_dirty() {
        let mut scheduler = UpdateScheduler::new();

        let derived_id = scheduler.add_node(Node::derived());
        let reaction_id = scheduler.add_node(Node::reaction());
        scheduler.add_edge(derived_id, reaction_id);
        scheduler.set_dirty_state(reaction_id, DirtyState::MaybeDirty);

        scheduler.confirm_changed(derived_id);
        assert_eq!(scheduler.dirty_state(reaction_id), DirtyState::Dirty);
    }

    #[test]
    fn flush_is_blocked_inside_batches() {
        let mut scheduler = UpdateScheduler::new();

        scheduler.begin_batch();
        scheduler.begin_batch();
        assert!(!scheduler.begin_flush());
        assert!(!scheduler.end_batch());
        assert!(scheduler.end_batch());

        assert!(scheduler.begin_flush());
        assert!(!scheduler.begin_flush());
        scheduler.end_flush();
        assert!(!scheduler.is_batching());
    }
}
