//! Opening branches and loading their children on first open.
//!
//! Per branch id the load state machine is `Unloaded -> Loading -> Loaded`:
//! - `Unloaded`: activation issues a `get` and moves to `Loading`
//! - `Loading`: activation toggles the branch but never issues a second fetch
//! - `Loaded`: terminal; activation only toggles
//!
//! A failed fetch returns the branch to `Unloaded`, so the next activation
//! retries. The check-then-transition in [`ExpansionController::request_children`]
//! is synchronous, so no second activation can slip past the gate while a
//! fetch is outstanding.

use std::collections::HashSet;

use phonebook_protocol::{DataRequest, NodeId, Subtree};

use crate::builder::TreeBuilder;
use crate::registry::NodeRegistry;
use crate::view::{ContainerRef, TreeView};

/// Load state of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Unloaded,
    Loading,
    Loaded,
}

/// Reacts to branch activations and load completions.
#[derive(Debug, Default)]
pub struct ExpansionController {
    /// Branches with a `get` outstanding.
    loading: HashSet<NodeId>,
}

impl ExpansionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, registry: &NodeRegistry, id: &NodeId) -> BranchState {
        if registry.is_loaded(id) {
            BranchState::Loaded
        } else if self.loading.contains(id) {
            BranchState::Loading
        } else {
            BranchState::Unloaded
        }
    }

    /// Number of outstanding branch fetches.
    pub fn in_flight(&self) -> usize {
        self.loading.len()
    }

    /// Handle a user activation of branch `id`.
    ///
    /// Always toggles the branch open/closed. Returns the fetch to perform
    /// when the branch has never been loaded and no load is outstanding.
    pub fn activate<V: TreeView>(
        &mut self,
        registry: &mut NodeRegistry,
        view: &mut V,
        id: &NodeId,
    ) -> Option<DataRequest> {
        if registry.toggle_expanded(id) {
            view.expand(id);
        } else {
            view.collapse(id);
        }
        self.request_children(registry, id)
    }

    /// Move `id` from `Unloaded` to `Loading` and return its fetch. In any
    /// other state this is a no-op.
    pub fn request_children(&mut self, registry: &NodeRegistry, id: &NodeId) -> Option<DataRequest> {
        match self.state(registry, id) {
            BranchState::Unloaded => {
                self.loading.insert(id.clone());
                tracing::info!(node = %id, "Fetching branch children");
                Some(DataRequest::Get(id.clone()))
            }
            BranchState::Loading => {
                tracing::debug!(node = %id, "Branch already loading");
                None
            }
            BranchState::Loaded => None,
        }
    }

    /// Build the fetched children of `id` and mark it loaded.
    ///
    /// Returns `false` when the branch was already loaded by another path
    /// (a search reveal): the first load wins and the payload is dropped.
    pub fn complete<V: TreeView>(
        &mut self,
        registry: &mut NodeRegistry,
        view: &mut V,
        id: &NodeId,
        payload: &Subtree,
    ) -> bool {
        self.loading.remove(id);
        if registry.is_loaded(id) {
            tracing::debug!(node = %id, "Branch already loaded, dropping payload");
            return false;
        }
        TreeBuilder::build(view, &ContainerRef::of(id), payload);
        registry.mark_loaded(id);
        true
    }

    /// Return `id` to `Unloaded` after a failed fetch.
    pub fn fail(&mut self, id: &NodeId) {
        self.loading.remove(id);
    }
}
