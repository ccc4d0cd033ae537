//! Per-node load and expansion bookkeeping.
//!
//! An entry is created the first time a branch is activated or revealed.
//! `loaded` only ever goes from false to true, which is what guarantees at
//! most one children fetch per branch for the lifetime of a session.

use std::collections::HashMap;

use phonebook_protocol::NodeId;

/// Observed state of a single node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    /// Children have been fetched and built at least once.
    pub loaded: bool,
    /// The branch is currently open.
    pub expanded: bool,
}

/// Tracks, per node id, whether its children were fetched and whether it
/// is open.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, NodeState>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `id`, `{loaded: false, expanded: false}` if never observed.
    pub fn state(&self, id: &NodeId) -> NodeState {
        self.nodes.get(id).copied().unwrap_or_default()
    }

    /// Whether an entry exists for `id`.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_loaded(&self, id: &NodeId) -> bool {
        self.state(id).loaded
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.state(id).expanded
    }

    /// Mark the children of `id` as fetched. Idempotent and permanent.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn mark_loaded(&mut self, id: &NodeId) -> bool {
        let entry = self.nodes.entry(id.clone()).or_default();
        if entry.loaded {
            return false;
        }
        entry.loaded = true;
        tracing::debug!(node = %id, "Branch marked loaded");
        true
    }

    pub fn set_expanded(&mut self, id: &NodeId, expanded: bool) {
        self.nodes.entry(id.clone()).or_default().expanded = expanded;
    }

    /// Flip the expansion flag and return the new value.
    pub fn toggle_expanded(&mut self, id: &NodeId) -> bool {
        let entry = self.nodes.entry(id.clone()).or_default();
        entry.expanded = !entry.expanded;
        entry.expanded
    }

    /// Close every known branch. Load state is kept.
    pub fn collapse_all(&mut self) {
        for state in self.nodes.values_mut() {
            state.expanded = false;
        }
    }

    /// Number of observed nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of branches whose children have been fetched.
    pub fn loaded_count(&self) -> usize {
        self.nodes.values().filter(|s| s.loaded).count()
    }
}
