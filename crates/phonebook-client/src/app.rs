//! The driver that ties the session to a data service.
//!
//! `PhonebookApp` runs on a single task. The session decides what to
//! fetch; the app spawns each fetch onto the runtime and the finished
//! result comes back over an mpsc channel, to be applied by the same
//! task that owns the session. Nothing is locked: the session is only
//! ever touched through `&mut self`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use phonebook_protocol::{DataRequest, FetchError, NodeId, Subtree};
use phonebook_tree::{DataService, ErrorBanner, ForestView, SearchConfig, SearchTicket, Session};

use crate::config::ClientConfig;
use crate::directory::MemoryDirectory;
use crate::http::HttpDataService;
use crate::tui::{LogCategory, LogEntry};

/// Maximum number of entries kept in the event log.
pub const EVENT_LOG_CAPACITY: usize = 1000;

/// A finished fetch, routed back to the session.
#[derive(Debug)]
pub enum Completion {
    Branch {
        id: NodeId,
        result: Result<Subtree, FetchError>,
    },
    Search {
        ticket: SearchTicket,
        result: Result<Subtree, FetchError>,
    },
}

pub struct PhonebookApp {
    session: Session<ForestView, ErrorBanner>,
    service: Arc<dyn DataService>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    /// Spawned fetches whose completion has not been applied yet.
    in_flight: usize,
    event_log: Vec<LogEntry>,
}

impl PhonebookApp {
    pub fn new(service: Arc<dyn DataService>, config: SearchConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session: Session::in_memory(config),
            service,
            completions_tx,
            completions_rx,
            in_flight: 0,
            event_log: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session<ForestView, ErrorBanner> {
        &self.session
    }

    pub fn view(&self) -> &ForestView {
        self.session.view()
    }

    /// The error line, if an error has been reported.
    pub fn error(&self) -> Option<&str> {
        self.session.reporter().message()
    }

    pub fn event_log(&self) -> &[LogEntry] {
        &self.event_log
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Push a log entry, capping the log at [`EVENT_LOG_CAPACITY`] entries.
    pub fn push_log(&mut self, category: LogCategory, message: String) {
        if self.event_log.len() >= EVENT_LOG_CAPACITY {
            self.event_log.remove(0);
        }
        self.event_log.push(LogEntry {
            timestamp: chrono::Utc::now(),
            category,
            message,
        });
    }

    /// Request the top-level departments.
    pub fn start(&mut self) {
        self.push_log(LogCategory::System, "Phonebook started".to_string());
        if let Some(request) = self.session.open_root() {
            self.dispatch_branch(NodeId::root(), request);
        }
    }

    /// The user activated branch `id`.
    pub fn activate(&mut self, id: &NodeId) {
        if let Some(request) = self.session.activate(id) {
            self.dispatch_branch(id.clone(), request);
        }
    }

    /// The search input changed to `input`.
    pub fn keyup(&mut self, input: &str, now: Instant) {
        self.session.on_keyup(input, now);
    }

    /// Escape: restore the tree and clear the query.
    pub fn escape(&mut self) {
        self.session.reset();
        self.session.reporter_mut().clear();
        self.push_log(LogCategory::System, "Reset".to_string());
    }

    /// Fire the debounce timer if it has elapsed at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(ticket) = self.session.on_debounce_elapsed(now) {
            self.dispatch_search(ticket);
        }
    }

    /// Apply every completion already waiting. Returns how many were applied.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.handle_completion(completion);
            applied += 1;
        }
        applied
    }

    /// Run until no fetch is in flight and no debounce timer is pending.
    pub async fn settle(&mut self) {
        loop {
            self.drain_completions();
            self.poll_timers(Instant::now());

            let deadline = self.session.debounce_deadline();
            if self.in_flight == 0 && deadline.is_none() {
                break;
            }

            let next = tokio::select! {
                completion = self.completions_rx.recv(), if self.in_flight > 0 => completion,
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => None,
            };
            if let Some(completion) = next {
                self.handle_completion(completion);
            }
        }
    }

    /// Load the root, optionally run one search, and return the displayed
    /// outline once everything has settled.
    pub async fn run_once(&mut self, query: Option<&str>) -> Vec<String> {
        self.start();
        self.settle().await;
        if let Some(query) = query {
            self.keyup(query, Instant::now());
            self.settle().await;
        }
        self.view().outline()
    }

    fn handle_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let reported = self.session.reporter().reported();

        match completion {
            Completion::Branch { id, result } => {
                if let Ok(payload) = &result {
                    self.push_log(
                        LogCategory::Fetch,
                        format!(
                            "Loaded {}: {} departments, {} abonents",
                            id,
                            payload.departments.len(),
                            payload.abonents.len()
                        ),
                    );
                }
                self.session.on_branch_loaded(&id, result);
            }
            Completion::Search { ticket, result } => {
                let applied = self.session.on_search_result(&ticket, result);
                if applied {
                    self.push_log(LogCategory::Search, format!("Results for \"{}\"", ticket.query));
                }
            }
        }

        if self.session.reporter().reported() > reported {
            let message = self.error().unwrap_or_default().to_string();
            self.push_log(LogCategory::Error, message);
        }
    }

    fn dispatch_branch(&mut self, id: NodeId, request: DataRequest) {
        self.spawn_fetch(request, move |result| Completion::Branch { id, result });
    }

    fn dispatch_search(&mut self, ticket: SearchTicket) {
        self.push_log(LogCategory::Search, format!("Searching \"{}\"", ticket.query));
        let request = DataRequest::Search(ticket.query.clone());
        self.spawn_fetch(request, move |result| Completion::Search { ticket, result });
    }

    fn spawn_fetch<F>(&mut self, request: DataRequest, complete: F)
    where
        F: FnOnce(Result<Subtree, FetchError>) -> Completion + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let tx = self.completions_tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = service.fetch(&request).await;
            // The receiver only goes away with the app itself.
            let _ = tx.send(complete(result));
        });
    }
}

/// Build the data service selected by the configuration: the fixture when
/// one is set, HTTP otherwise.
pub fn service_from_config(config: &ClientConfig) -> Result<Arc<dyn DataService>, anyhow::Error> {
    match &config.service.fixture {
        Some(path) => Ok(Arc::new(MemoryDirectory::load(path)?)),
        None => {
            let service = HttpDataService::new(&config.service.base_url, config.request_timeout())?;
            tracing::info!(endpoint = %service.endpoint(), "Using HTTP directory service");
            Ok(Arc::new(service))
        }
    }
}
