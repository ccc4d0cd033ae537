//! End-to-end tests for the driver against in-memory services.
//!
//! Verifies:
//! - A branch is fetched at most once however often it is activated
//! - A burst of keystrokes produces one search with the final input
//! - A superseded search response never reaches the tree
//! - Fetch failures surface on the error line and in the event log

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use phonebook_client::tui::LogCategory;
use phonebook_client::{MemoryDirectory, PhonebookApp};
use phonebook_protocol::{FetchError, NodeId, Subtree};
use phonebook_tree::{DataService, SearchConfig};

const FIXTURE: &str = include_str!("fixtures/phonebook.json");

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Wraps the fixture directory, counting calls and optionally delaying
/// responses per query.
#[derive(Default)]
struct CountingService {
    directory: MemoryDirectory,
    gets: Mutex<HashMap<NodeId, usize>>,
    searches: Mutex<Vec<String>>,
    get_delay: Duration,
    search_delays: HashMap<String, Duration>,
}

impl CountingService {
    fn new() -> Self {
        Self {
            directory: MemoryDirectory::from_json(FIXTURE).unwrap(),
            ..Default::default()
        }
    }

    fn gets_of(&self, node: &str) -> usize {
        self.gets.lock().unwrap().get(&id(node)).copied().unwrap_or(0)
    }

    fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataService for CountingService {
    async fn get(&self, node: &NodeId) -> Result<Subtree, FetchError> {
        *self.gets.lock().unwrap().entry(node.clone()).or_default() += 1;
        tokio::time::sleep(self.get_delay).await;
        self.directory.subtree(node)
    }

    async fn search(&self, query: &str) -> Result<Subtree, FetchError> {
        self.searches.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        self.directory.find(query)
    }
}

/// Fails every request with a fixed error.
struct FailingService(FetchError);

#[async_trait]
impl DataService for FailingService {
    async fn get(&self, _id: &NodeId) -> Result<Subtree, FetchError> {
        Err(self.0.clone())
    }

    async fn search(&self, _query: &str) -> Result<Subtree, FetchError> {
        Err(self.0.clone())
    }
}

fn app_with(service: Arc<dyn DataService>) -> PhonebookApp {
    PhonebookApp::new(service, SearchConfig::default())
}

async fn started(service: Arc<CountingService>) -> PhonebookApp {
    let mut app = app_with(service);
    app.start();
    app.settle().await;
    app
}

// ═══════════════════════════════════════════════════════════════
// Lazy loading
// ═══════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn start_renders_top_level_collapsed() {
    let service = Arc::new(CountingService::new());
    let app = started(service.clone()).await;

    assert_eq!(app.view().outline(), vec!["+ Headquarters", "+ IT"]);
    assert_eq!(service.gets_of("0"), 1);
    assert_eq!(app.in_flight(), 0);
    assert!(app.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn repeated_activation_fetches_once() {
    let service = Arc::new(CountingService {
        get_delay: ms(200),
        ..CountingService::new()
    });
    let mut app = started(service.clone()).await;

    // Five activations while the first fetch is still in flight.
    for _ in 0..5 {
        app.activate(&id("1"));
    }
    assert_eq!(app.in_flight(), 1);
    app.settle().await;

    // Opened, closed, opened, closed, opened.
    assert_eq!(service.gets_of("1"), 1);
    assert!(app.view().is_expanded(&id("1")));
    assert_eq!(
        app.view().outline(),
        vec![
            "- Headquarters",
            "  * Ivanov Ivan Ivanovich, Director [100, +7 495 100-00-00]",
            "  + Finance",
            "+ IT",
        ]
    );

    // Later toggles never refetch.
    app.activate(&id("1"));
    app.activate(&id("1"));
    app.settle().await;
    assert_eq!(service.gets_of("1"), 1);
}

#[tokio::test(start_paused = true)]
async fn nested_branches_load_on_demand() {
    let service = Arc::new(CountingService::new());
    let mut app = started(service.clone()).await;

    app.activate(&id("1"));
    app.settle().await;
    app.activate(&id("2"));
    app.settle().await;

    assert_eq!(service.gets_of("2"), 1);
    assert_eq!(service.gets_of("3"), 0, "Accounting is never opened");
    assert!(app.view().is_displayed(&id("102")));
    assert!(app.view().contains(&id("3")));
    assert!(!app.view().contains(&id("103")));
}

// ═══════════════════════════════════════════════════════════════
// Search
// ═══════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn typing_burst_issues_one_search() {
    let service = Arc::new(CountingService::new());
    let mut app = started(service.clone()).await;

    for input in ["s", "sm", "smi", "smir"] {
        app.keyup(input, Instant::now());
        tokio::time::advance(ms(120)).await;
        app.poll_timers(Instant::now());
    }
    assert!(service.searches().is_empty(), "Still inside the quiet period");

    app.settle().await;

    assert_eq!(service.searches(), vec!["smir".to_string()]);
    assert_eq!(
        app.view().outline(),
        vec![
            "- IT",
            "  - Support",
            "    * Smirnov Ivan Petrovich, Engineer [501, 555-12-34]",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn search_reveals_paths_through_unloaded_branches() {
    let service = Arc::new(CountingService::new());
    let mut app = app_with(service.clone());

    let outline = app.run_once(Some("ivan")).await;

    assert_eq!(
        outline,
        vec![
            "- Headquarters",
            "  * Ivanov Ivan Ivanovich, Director [100, +7 495 100-00-00]",
            "  - Finance",
            "    - Accounting",
            "      * Sidorov Petr Ivanovich, Accountant [301, 302]",
            "- IT",
            "  - Support",
            "    * Smirnov Ivan Petrovich, Engineer [501, 555-12-34]",
        ]
    );
    // Branches built from the result are loaded: opening them needs no fetch.
    app.escape();
    app.activate(&id("3"));
    app.settle().await;
    assert_eq!(service.gets_of("3"), 0);
    assert_eq!(service.gets_of("0"), 1);
}

#[tokio::test(start_paused = true)]
async fn superseded_search_is_discarded() {
    let mut search_delays = HashMap::new();
    search_delays.insert("petrova".to_string(), ms(2000));
    let service = Arc::new(CountingService {
        search_delays,
        ..CountingService::new()
    });
    let mut app = started(service.clone()).await;

    app.keyup("petrova", Instant::now());
    tokio::time::advance(ms(500)).await;
    app.poll_timers(Instant::now());

    app.keyup("popov", Instant::now());
    tokio::time::advance(ms(500)).await;
    app.poll_timers(Instant::now());

    app.settle().await;

    let mut searches = service.searches();
    searches.sort();
    assert_eq!(searches, vec!["petrova".to_string(), "popov".to_string()]);
    assert!(app.view().is_displayed(&id("106")));
    assert!(!app.view().is_displayed(&id("1")), "Late result for petrova never applied");
}

#[tokio::test(start_paused = true)]
async fn shrinking_query_restores_tree() {
    let service = Arc::new(CountingService::new());
    let mut app = started(service.clone()).await;

    app.keyup("popov", Instant::now());
    app.settle().await;
    app.keyup("po", Instant::now());
    app.settle().await;

    assert_eq!(service.searches().len(), 1);
    assert_eq!(app.view().outline(), vec!["+ Headquarters", "+ IT"]);
}

#[tokio::test(start_paused = true)]
async fn escape_resets_and_clears_error() {
    let service = Arc::new(CountingService::new());
    let mut app = started(service.clone()).await;

    app.keyup("smir", Instant::now());
    app.settle().await;
    app.escape();

    assert_eq!(app.view().outline(), vec!["+ Headquarters", "+ IT"]);
    assert_eq!(app.session().search().input(), "");
    assert!(app.error().is_none());
    assert!(app
        .event_log()
        .iter()
        .any(|e| e.category == LogCategory::System && e.message == "Reset"));
}

// ═══════════════════════════════════════════════════════════════
// Failures
// ═══════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn failed_root_load_is_reported() {
    let mut app = app_with(Arc::new(FailingService(FetchError::ServerError)));
    let outline = app.run_once(None).await;

    assert!(outline.is_empty());
    assert_eq!(app.error(), Some("Internal Server Error (500)."));
    assert!(app
        .event_log()
        .iter()
        .any(|e| e.category == LogCategory::Error && e.message == "Internal Server Error (500)."));
}

#[tokio::test(start_paused = true)]
async fn failed_search_is_reported() {
    let mut app = app_with(Arc::new(FailingService(FetchError::Timeout)));
    app.keyup("ivanov", Instant::now());
    app.settle().await;
    assert_eq!(app.error(), Some("Time out error."));
}

#[tokio::test(start_paused = true)]
async fn unknown_branch_reports_not_found() {
    let service = Arc::new(CountingService::new());
    let mut app = started(service).await;
    app.activate(&id("42"));
    app.settle().await;
    assert_eq!(app.error(), Some("Requested page not found (404)."));
}

// ═══════════════════════════════════════════════════════════════
// Event log
// ═══════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn event_log_is_capped() {
    let service = Arc::new(CountingService::new());
    let mut app = started(service).await;
    for i in 0..1500 {
        app.push_log(LogCategory::System, format!("entry {}", i));
    }
    assert_eq!(app.event_log().len(), 1000);
    assert_eq!(app.event_log()[999].message, "entry 1499");
}
