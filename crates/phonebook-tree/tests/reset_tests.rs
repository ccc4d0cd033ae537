//! Tests for the Escape reset.

use std::time::Duration;

use tokio::time::Instant;

use phonebook_protocol::{Abonent, NodeId, Subtree};
use phonebook_tree::{ForestView, SearchConfig, Session};

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn searched_session() -> (Session<ForestView>, Instant) {
    let mut session = Session::in_memory(SearchConfig::default());
    session.open_root();
    session.on_branch_loaded(
        &NodeId::root(),
        Ok(Subtree::default().with_departments(vec![
            Subtree::department("1", "HQ"),
            Subtree::department("2", "Branch"),
        ])),
    );

    let t0 = Instant::now();
    session.on_keyup("ivan", t0);
    let ticket = session
        .on_debounce_elapsed(t0 + Duration::from_millis(500))
        .expect("search issued");
    let result = Subtree::department("0", "root")
        .with_show(&["1"], &[])
        .with_departments(vec![
            Subtree::department("1", "HQ")
                .with_show(&[], &["5"])
                .with_abonents(vec![
                    Abonent::new("5", "Ivanov", "Ivan", "Ivanovich"),
                    Abonent::new("6", "Petrov", "Petr", "Petrovich"),
                ]),
            Subtree::department("2", "Branch"),
        ]);
    assert!(session.on_search_result(&ticket, Ok(result)));
    (session, t0 + Duration::from_millis(1000))
}

fn snapshot(session: &Session<ForestView>) -> Vec<(NodeId, bool, bool)> {
    let view = session.view();
    view.ids()
        .map(|n| (n.clone(), view.is_visible(n), view.is_expanded(n)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════
// Reset
// ═══════════════════════════════════════════════════════════════

#[test]
fn reset_shows_everything_collapsed() {
    let (mut session, _) = searched_session();
    session.reset();

    for (node, visible, expanded) in snapshot(&session) {
        assert!(visible, "{} must be visible", node);
        assert!(!expanded, "{} must be collapsed", node);
    }
    assert_eq!(session.view().outline(), vec!["+ HQ", "+ Branch"]);
    assert!(!session.registry().is_expanded(&id("1")));
}

#[test]
fn reset_clears_input_and_query() {
    let (mut session, _) = searched_session();
    session.reset();
    assert_eq!(session.search().input(), "");
    assert_eq!(session.search().previous_query(), "");
}

#[test]
fn reset_is_idempotent() {
    let (mut session, _) = searched_session();
    session.reset();
    let once = snapshot(&session);
    session.reset();
    assert_eq!(snapshot(&session), once);
}

#[test]
fn reset_keeps_loaded_branches() {
    let (mut session, _) = searched_session();
    session.reset();
    assert!(session.registry().is_loaded(&id("1")));
    assert_eq!(session.activate(&id("1")), None);
    assert_eq!(
        session.view().outline(),
        vec![
            "- HQ",
            "  * Ivanov Ivan Ivanovich",
            "  * Petrov Petr Petrovich",
            "+ Branch"
        ]
    );
}

#[test]
fn reset_cancels_pending_debounce() {
    let (mut session, now) = searched_session();
    session.on_keyup("petr", now);
    assert!(session.debounce_deadline().is_some());

    session.reset();

    assert_eq!(session.debounce_deadline(), None);
    assert!(session
        .on_debounce_elapsed(now + Duration::from_millis(600))
        .is_none());
}

#[test]
fn reset_discards_in_flight_search() {
    let (mut session, now) = searched_session();
    session.on_keyup("petr", now);
    let ticket = session
        .on_debounce_elapsed(now + Duration::from_millis(500))
        .expect("search issued");

    session.reset();
    let before = snapshot(&session);

    assert!(!session.on_search_result(&ticket, Ok(Subtree::default())));
    assert_eq!(snapshot(&session), before);
}

#[test]
fn same_query_searches_again_after_reset() {
    let (mut session, now) = searched_session();
    session.reset();
    session.on_keyup("ivan", now);
    let ticket = session.on_debounce_elapsed(now + Duration::from_millis(500));
    assert_eq!(ticket.map(|t| t.query), Some("ivan".to_string()));
}
