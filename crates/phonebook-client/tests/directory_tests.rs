//! Tests for the fixture-backed in-memory directory.

use phonebook_client::MemoryDirectory;
use phonebook_protocol::{FetchError, NodeId};
use phonebook_tree::DataService;

const FIXTURE: &str = include_str!("fixtures/phonebook.json");

fn directory() -> MemoryDirectory {
    MemoryDirectory::from_json(FIXTURE).expect("fixture parses")
}

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn ids(list: &[NodeId]) -> Vec<&str> {
    list.iter().map(|n| n.as_str()).collect()
}

// ═══════════════════════════════════════════════════════════════
// get
// ═══════════════════════════════════════════════════════════════

#[test]
fn fixture_loads() {
    let dir = directory();
    assert_eq!(dir.department_count(), 5);
    assert_eq!(dir.abonent_count(), 6);
}

#[test]
fn root_lists_top_level_departments() {
    let root = directory().subtree(&NodeId::root()).unwrap();
    assert_eq!(root.title.as_deref(), Some("root"));
    assert!(root.abonents.is_empty());

    let titles: Vec<_> = root
        .departments
        .iter()
        .map(|d| d.title.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(titles, vec!["Headquarters", "IT"]);
    assert!(
        root.departments.iter().all(|d| d.departments.is_empty() && d.abonents.is_empty()),
        "Child departments carry only id and title"
    );
}

#[test]
fn department_lists_direct_children_only() {
    let finance = directory().subtree(&id("2")).unwrap();
    assert_eq!(finance.title.as_deref(), Some("Finance"));
    assert_eq!(finance.departments.len(), 1);
    assert_eq!(finance.departments[0].id, Some(id("3")));
    assert_eq!(finance.abonents.len(), 1);
    assert_eq!(finance.abonents[0].surname, "Petrova");
    assert!(finance.show.is_none());
}

#[test]
fn unknown_department_is_not_found() {
    assert!(matches!(
        directory().subtree(&id("99")),
        Err(FetchError::NotFound)
    ));
}

#[tokio::test]
async fn data_service_routes_get_and_search() {
    let dir = directory();
    let root = dir.get(&NodeId::root()).await.unwrap();
    assert_eq!(root.departments.len(), 2);
    let found = dir.search("popov").await.unwrap();
    assert_eq!(found.show.map(|s| ids(&s.departments).join(",")), Some("4".to_string()));
}

// ═══════════════════════════════════════════════════════════════
// search
// ═══════════════════════════════════════════════════════════════

#[test]
fn no_match_is_empty() {
    let tree = directory().find("zzz").unwrap();
    assert!(tree.is_empty());
    assert!(tree.show.is_none());
}

#[test]
fn match_builds_path_from_root() {
    let tree = directory().find("kuzn").unwrap();

    let show = tree.show.as_ref().unwrap();
    assert_eq!(ids(&show.departments), vec!["1"]);
    assert!(show.abonents.is_empty());
    assert_eq!(tree.departments.len(), 2, "Root level keeps its full child list");

    let hq = tree.child(&id("1")).unwrap();
    assert_eq!(ids(&hq.show.as_ref().unwrap().departments), vec!["2"]);
    assert_eq!(hq.abonents.len(), 1, "Full abonent list on the path");

    let finance = hq.child(&id("2")).unwrap();
    assert_eq!(ids(&finance.show.as_ref().unwrap().departments), vec!["3"]);

    let accounting = finance.child(&id("3")).unwrap();
    let show = accounting.show.as_ref().unwrap();
    assert_eq!(ids(&show.abonents), vec!["104"]);
    assert_eq!(accounting.abonents.len(), 2);

    let it = tree.child(&id("4")).unwrap();
    assert!(it.show.is_none(), "Off-path department is not expanded");
    assert!(it.abonents.is_empty());
}

#[test]
fn name_match_is_case_insensitive() {
    let tree = directory().find("IVAN").unwrap();
    let show = tree.show.unwrap();
    assert_eq!(ids(&show.departments), vec!["1", "4"]);

    let hq = tree.departments.iter().find(|d| d.id == Some(id("1"))).unwrap();
    let hq_show = hq.show.as_ref().unwrap();
    assert_eq!(ids(&hq_show.abonents), vec!["101"]);
    assert_eq!(ids(&hq_show.departments), vec!["2"]);
}

#[test]
fn phone_match_uses_joined_numbers() {
    let tree = directory().find("555-12").unwrap();
    let support = tree
        .child(&id("4"))
        .and_then(|it| it.child(&id("5")))
        .unwrap();
    assert_eq!(ids(&support.show.as_ref().unwrap().abonents), vec!["105"]);

    // Extensions are concatenated without separators.
    let tree = directory().find("301302").unwrap();
    assert!(!tree.is_empty());
}

#[test]
fn shared_paths_are_merged() {
    // Petrova in Finance, Sidorov and Kuznetsova in Accounting, Smirnov in Support.
    let tree = directory().find("petr").unwrap();
    assert_eq!(ids(&tree.show.as_ref().unwrap().departments), vec!["1", "4"]);

    let finance = tree.child(&id("1")).and_then(|hq| hq.child(&id("2"))).unwrap();
    let show = finance.show.as_ref().unwrap();
    assert_eq!(ids(&show.departments), vec!["3"]);
    assert_eq!(ids(&show.abonents), vec!["102"]);

    let accounting = finance.child(&id("3")).unwrap();
    assert_eq!(ids(&accounting.show.as_ref().unwrap().abonents), vec!["103", "104"]);
}

#[test]
fn post_is_not_searched() {
    assert!(directory().find("accountant").unwrap().is_empty());
}

#[test]
fn parent_cycle_is_cut() {
    let dir = MemoryDirectory::from_json(
        r#"{
            "departments": [
                {"id": 1, "title": "A", "parent_id": 2},
                {"id": 2, "title": "B", "parent_id": 1}
            ],
            "abonents": [
                {"id": 10, "department": 1, "surname": "Loop"}
            ]
        }"#,
    )
    .unwrap();

    let tree = dir.find("loop").unwrap();
    assert!(tree.show.unwrap().departments.is_empty());
}

#[test]
fn dangling_department_reference_is_skipped() {
    let dir = MemoryDirectory::from_json(
        r#"{
            "departments": [{"id": 1, "title": "A"}],
            "abonents": [
                {"id": 10, "department": 7, "surname": "Lost"},
                {"id": 11, "department": 1, "surname": "Lostov"}
            ]
        }"#,
    )
    .unwrap();

    let tree = dir.find("lost").unwrap();
    let a = tree.child(&id("1")).unwrap();
    assert_eq!(ids(&a.show.as_ref().unwrap().abonents), vec!["11"]);
}

#[test]
fn load_reads_fixture_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), FIXTURE).unwrap();
    let dir = MemoryDirectory::load(file.path()).unwrap();
    assert_eq!(dir.abonent_count(), 6);
}

#[test]
fn load_rejects_malformed_fixture() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "{ not json").unwrap();
    assert!(MemoryDirectory::load(file.path()).is_err());
}
