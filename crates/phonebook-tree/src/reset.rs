//! Return to the initial tree: every node visible, every branch collapsed.

use crate::registry::NodeRegistry;
use crate::search::SearchController;
use crate::view::TreeView;

pub struct ResetController;

impl ResetController {
    /// Show every node and collapse every branch. Loaded children stay
    /// built, so reopening a branch needs no fetch.
    pub fn restore_tree<V: TreeView>(registry: &mut NodeRegistry, view: &mut V) {
        view.restore_all();
        registry.collapse_all();
    }

    /// Escape: restore the tree and clear the search input and remembered
    /// query.
    pub fn reset<V: TreeView>(
        registry: &mut NodeRegistry,
        view: &mut V,
        search: &mut SearchController,
    ) {
        Self::restore_tree(registry, view);
        search.reset();
        tracing::info!("Tree reset");
    }
}
