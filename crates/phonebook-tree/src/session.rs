//! The single long-lived UI session.
//!
//! Owns the registry, the rendered view, the controllers and the error
//! line. All mutation happens through `&mut self` on one event loop, so
//! no locking is involved. Methods returning a request or ticket expect
//! the caller to execute it and feed the completion back.

use tokio::time::Instant;

use phonebook_protocol::{DataRequest, FetchError, NodeId, Subtree};

use crate::builder::TreeBuilder;
use crate::expansion::{BranchState, ExpansionController};
use crate::forest::ForestView;
use crate::registry::NodeRegistry;
use crate::reset::ResetController;
use crate::search::{reveal, SearchConfig, SearchController, SearchStep, SearchTicket};
use crate::view::{ContainerRef, ErrorBanner, ErrorReporter, TreeView};

pub struct Session<V: TreeView, R: ErrorReporter = ErrorBanner> {
    registry: NodeRegistry,
    view: V,
    expansion: ExpansionController,
    search: SearchController,
    reporter: R,
}

impl Session<ForestView, ErrorBanner> {
    /// A session rendering into an in-memory forest.
    pub fn in_memory(config: SearchConfig) -> Self {
        Self::new(ForestView::new(), ErrorBanner::new(), config)
    }
}

impl<V: TreeView, R: ErrorReporter> Session<V, R> {
    pub fn new(view: V, reporter: R, config: SearchConfig) -> Self {
        Self {
            registry: NodeRegistry::new(),
            view,
            expansion: ExpansionController::new(),
            search: SearchController::new(config),
            reporter,
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    pub fn branch_state(&self, id: &NodeId) -> BranchState {
        self.expansion.state(&self.registry, id)
    }

    /// Outstanding branch fetches.
    pub fn loads_in_flight(&self) -> usize {
        self.expansion.in_flight()
    }

    /// Request the top-level departments. Their payload is built into the
    /// root container.
    pub fn open_root(&mut self) -> Option<DataRequest> {
        let root = NodeId::root();
        self.registry.set_expanded(&root, true);
        self.expansion.request_children(&self.registry, &root)
    }

    /// The user activated branch `id`.
    pub fn activate(&mut self, id: &NodeId) -> Option<DataRequest> {
        self.expansion.activate(&mut self.registry, &mut self.view, id)
    }

    /// A branch fetch finished.
    pub fn on_branch_loaded(&mut self, id: &NodeId, result: Result<Subtree, FetchError>) {
        match result {
            Ok(payload) => {
                self.expansion
                    .complete(&mut self.registry, &mut self.view, id, &payload);
            }
            Err(err) => {
                self.expansion.fail(id);
                tracing::warn!(node = %id, error = %err, "Branch fetch failed");
                self.reporter.report_error(&err.user_message());
            }
        }
    }

    /// A key was released in the search input; `input` is its new content.
    pub fn on_keyup(&mut self, input: &str, now: Instant) {
        self.search.on_keyup(input, now);
    }

    /// When the pending debounce timer fires, if any.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// Poll the debounce timer. Returns the search to issue, if the settled
    /// input calls for one; a shrink below the threshold is applied here.
    pub fn on_debounce_elapsed(&mut self, now: Instant) -> Option<SearchTicket> {
        match self.search.poll(now) {
            SearchStep::Query(ticket) => Some(ticket),
            SearchStep::Restore => {
                ResetController::restore_tree(&mut self.registry, &mut self.view);
                None
            }
            SearchStep::Pending | SearchStep::Idle => None,
        }
    }

    /// A search finished. Returns `true` if the result was applied.
    ///
    /// Responses to superseded tickets are dropped without touching the
    /// tree or the error line.
    pub fn on_search_result(
        &mut self,
        ticket: &SearchTicket,
        result: Result<Subtree, FetchError>,
    ) -> bool {
        if !self.search.is_current(ticket) {
            tracing::debug!(seq = ticket.seq, query = %ticket.query, "Discarding stale search response");
            return false;
        }

        let tree = match result {
            Ok(tree) => tree,
            Err(err) => {
                self.search.on_failure(ticket);
                tracing::warn!(query = %ticket.query, error = %err, "Search failed");
                self.reporter.report_error(&err.user_message());
                return false;
            }
        };

        // An empty result leaves an unloaded root to its pending `get`.
        let root = NodeId::root();
        if !self.registry.is_loaded(&root) && !tree.is_empty() {
            TreeBuilder::build(&mut self.view, &ContainerRef::root(), &tree);
            self.registry.mark_loaded(&root);
        }

        self.view.hide_all();
        let report = reveal(&mut self.registry, &mut self.view, &tree);
        tracing::info!(
            seq = ticket.seq,
            query = %ticket.query,
            branches = report.branches,
            leaves = report.leaves,
            built = report.built,
            "Search result applied"
        );
        true
    }

    /// Escape: collapse and show everything, clear the query.
    pub fn reset(&mut self) {
        ResetController::reset(&mut self.registry, &mut self.view, &mut self.search);
    }
}
