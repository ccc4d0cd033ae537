//! Debounced incremental search and reconciliation of results.
//!
//! Every keystroke restarts a quiet-period timer. When it fires, the
//! current input is compared against the previously settled query:
//! - long enough and different: a search is issued under a fresh sequence
//!   number; only the response for the newest number is ever applied
//! - shrunk below the threshold from a searchable query: the whole tree
//!   returns to collapsed-but-visible
//! - otherwise nothing happens
//!
//! The result tree is applied by hiding everything and then walking it
//! depth-first with [`reveal`], which opens exactly the branches on a path
//! to a match and shows exactly the matched leaves. Branches on the path
//! that were never loaded are built from the result itself.

use std::time::Duration;

use tokio::time::Instant;

use phonebook_protocol::{Subtree, DEBOUNCE_MS, MIN_QUERY_LEN};

use crate::builder::TreeBuilder;
use crate::registry::NodeRegistry;
use crate::view::{ContainerRef, TreeView};

/// Search timing and threshold.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke.
    pub debounce: Duration,
    /// Minimum query length in characters.
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            min_query_len: MIN_QUERY_LEN,
        }
    }
}

/// A cancellable one-shot timer. Restarting replaces the previous deadline.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the timer if it has elapsed at `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// An issued search. Responses are matched back to it by `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

/// Outcome of polling the debounce timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStep {
    /// Timer not armed or not yet elapsed.
    Pending,
    /// Timer fired but the settled input calls for no action.
    Idle,
    /// Issue this search.
    Query(SearchTicket),
    /// Query shrank below the threshold: restore the whole tree.
    Restore,
}

/// Debounce, threshold and last-query-wins bookkeeping.
#[derive(Debug)]
pub struct SearchController {
    config: SearchConfig,
    input: String,
    previous_query: String,
    /// The previous query failed and may be issued again unchanged.
    retry_previous: bool,
    debounce: Debouncer,
    last_seq: u64,
    current: Option<u64>,
}

impl SearchController {
    pub fn new(config: SearchConfig) -> Self {
        let debounce = Debouncer::new(config.debounce);
        Self {
            config,
            input: String::new(),
            previous_query: String::new(),
            retry_previous: false,
            debounce,
            last_seq: 0,
            current: None,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Current content of the search input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The last settled query.
    pub fn previous_query(&self) -> &str {
        &self.previous_query
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Record the input after a key release and restart the quiet period.
    pub fn on_keyup(&mut self, input: &str, now: Instant) {
        self.input = input.to_string();
        self.debounce.restart(now);
    }

    /// Poll the debounce timer and decide what the settled input calls for.
    pub fn poll(&mut self, now: Instant) -> SearchStep {
        if !self.debounce.fire(now) {
            return SearchStep::Pending;
        }

        let query = self.input.clone();
        let changed = query != self.previous_query || self.retry_previous;
        let step = if self.is_searchable(&query) && changed {
            self.last_seq += 1;
            self.current = Some(self.last_seq);
            tracing::info!(seq = self.last_seq, query = %query, "Issuing search");
            SearchStep::Query(SearchTicket {
                seq: self.last_seq,
                query: query.clone(),
            })
        } else if self.is_searchable(&self.previous_query) && query != self.previous_query {
            self.current = None;
            tracing::debug!(query = %query, "Query below threshold, restoring tree");
            SearchStep::Restore
        } else {
            SearchStep::Idle
        };

        self.previous_query = query;
        self.retry_previous = false;
        step
    }

    /// Whether a response for `ticket` may still be applied.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.current == Some(ticket.seq)
    }

    /// A current search failed: allow the same query to be issued again.
    pub fn on_failure(&mut self, ticket: &SearchTicket) {
        if self.is_current(ticket) {
            self.current = None;
            if self.previous_query == ticket.query {
                self.retry_previous = true;
            }
        }
    }

    /// Clear the input and remembered query, cancel the timer and drop any
    /// outstanding search.
    pub fn reset(&mut self) {
        self.input.clear();
        self.previous_query.clear();
        self.retry_previous = false;
        self.debounce.cancel();
        self.current = None;
    }

    fn is_searchable(&self, query: &str) -> bool {
        query.chars().count() >= self.config.min_query_len
    }
}

/// Counts of what a reveal touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealReport {
    /// Branches opened on a matched path.
    pub branches: usize,
    /// Leaves shown.
    pub leaves: usize,
    /// Branches built from the result because they were never loaded.
    pub built: usize,
}

/// Reveal the matched paths of `tree` in a view where everything below
/// this level is already hidden.
///
/// The walk goes from the root downward, so every department on a path is
/// rendered by the time it is visited: either it was loaded before, or its
/// parent was built from the result one level up.
pub fn reveal<V: TreeView>(registry: &mut NodeRegistry, view: &mut V, tree: &Subtree) -> RevealReport {
    let mut report = RevealReport::default();
    reveal_level(registry, view, tree, &mut report);
    report
}

fn reveal_level<V: TreeView>(
    registry: &mut NodeRegistry,
    view: &mut V,
    tree: &Subtree,
    report: &mut RevealReport,
) {
    for department in &tree.departments {
        let Some(id) = &department.id else {
            continue;
        };
        if !tree.shows_department(id) {
            continue;
        }
        if !registry.is_loaded(id) {
            TreeBuilder::build(view, &ContainerRef::of(id), department);
            registry.mark_loaded(id);
            report.built += 1;
        }
        registry.set_expanded(id, true);
        view.expand(id);
        view.show(id);
        // Only the path stays open, not the whole subtree.
        view.hide_descendants(id);
        report.branches += 1;

        reveal_level(registry, view, department, report);
    }

    for abonent in &tree.abonents {
        if let Some(id) = &abonent.id {
            if tree.shows_abonent(id) {
                view.show(id);
                report.leaves += 1;
            }
        }
    }
}
