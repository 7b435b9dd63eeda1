//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal or memo is read,
//! we record it as a dependency of the current computation.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing computation.
//! When entering a reactive context (e.g., running a memo or a reaction), we
//! push the node onto the stack. When the computation completes, we pop it.
//!
//! This design supports nested reactive contexts (e.g., a memo that reads
//! from another memo while a reaction is tracking).

use std::cell::RefCell;

use smallvec::SmallVec;

use crate::graph::NodeId;

/// Dependencies collected by one computation run.
pub type Dependencies = SmallVec<[NodeId; 8]>;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = RefCell::new(Vec::new());
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone)]
struct ContextEntry {
    /// The node of the running computation.
    node_id: NodeId,
    /// Nodes read during this computation, deduplicated, in read order.
    dependencies: Dependencies,
}

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the computation panics.
pub struct ReactiveContext {
    node_id: NodeId,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given node.
    ///
    /// The context is automatically exited when the returned guard is dropped.
    pub fn enter(node_id: NodeId) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                node_id,
                dependencies: Dependencies::new(),
            });
        });

        Self { node_id }
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the node of the running computation, if any.
    pub fn current() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().map(|entry| entry.node_id))
    }

    /// Record a dependency on the given node.
    ///
    /// This is called by signals and memos when they are read.
    pub fn track_dependency(node_id: NodeId) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if entry.node_id != node_id && !entry.dependencies.contains(&node_id) {
                    entry.dependencies.push(node_id);
                }
            }
        });
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> Dependencies {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.node_id, self.node_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.node_id, entry.node_id
                );
            }
        });
    }
}
