//! In-memory directory backed by a flat JSON fixture.
//!
//! Answers `get` and `search` with the same payload shapes as the web
//! endpoint, so the client runs offline and the driver can be tested
//! without a network.
//!
//! Fixture format:
//!
//! ```json
//! {
//!   "departments": [{"id": 1, "title": "HQ", "parent_id": null}],
//!   "abonents": [{"id": 5, "department": 1, "surname": "Ivanov",
//!                 "extension": ["101"], "landline": []}]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use phonebook_protocol::{Abonent, FetchError, NodeId, ShowSet, Subtree};
use phonebook_tree::DataService;

/// A department row. `parent_id` of `None` or `"0"` places it at the top level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentRecord {
    pub id: NodeId,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
}

/// An abonent row, attached to exactly one department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbonentRecord {
    pub id: NodeId,
    pub department: NodeId,
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub patronymic: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub extension: Vec<String>,
    #[serde(default)]
    pub landline: Vec<String>,
}

impl AbonentRecord {
    fn to_abonent(&self) -> Abonent {
        Abonent {
            id: Some(self.id.clone()),
            post: self.post.clone(),
            surname: self.surname.clone(),
            name: self.name.clone(),
            patronymic: self.patronymic.clone(),
            rank: self.rank.clone(),
            extension: self.extension.clone(),
            landline: self.landline.clone(),
        }
    }

    /// Case-insensitive match on the name parts, plain substring match on
    /// the concatenated phone numbers.
    fn matches(&self, needle: &str) -> bool {
        [&self.surname, &self.name, &self.patronymic]
            .iter()
            .any(|part| part.to_lowercase().contains(needle))
            || self.extension.concat().contains(needle)
            || self.landline.concat().contains(needle)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFixture {
    #[serde(default)]
    pub departments: Vec<DepartmentRecord>,
    #[serde(default)]
    pub abonents: Vec<AbonentRecord>,
}

/// Directory data held in memory, in fixture order.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    departments: Vec<DepartmentRecord>,
    abonents: Vec<AbonentRecord>,
}

impl MemoryDirectory {
    pub fn new(fixture: DirectoryFixture) -> Self {
        Self {
            departments: fixture.departments,
            abonents: fixture.abonents,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load a fixture file.
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)?;
        let directory = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            departments = directory.departments.len(),
            abonents = directory.abonents.len(),
            "Loaded directory fixture"
        );
        Ok(directory)
    }

    pub fn department_count(&self) -> usize {
        self.departments.len()
    }

    pub fn abonent_count(&self) -> usize {
        self.abonents.len()
    }

    fn department(&self, id: &NodeId) -> Option<&DepartmentRecord> {
        self.departments.iter().find(|d| &d.id == id)
    }

    fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.department(id)?
            .parent_id
            .as_ref()
            .filter(|parent| !parent.is_root())
    }

    /// A department with its direct children. Child departments carry
    /// only id and title.
    pub fn subtree(&self, id: &NodeId) -> Result<Subtree, FetchError> {
        let title = if id.is_root() {
            "root".to_string()
        } else {
            self.department(id).ok_or(FetchError::NotFound)?.title.clone()
        };

        let departments = self
            .departments
            .iter()
            .filter(|d| {
                let parent = d.parent_id.as_ref().filter(|p| !p.is_root());
                match parent {
                    Some(parent) => parent == id,
                    None => id.is_root(),
                }
            })
            .map(|d| Subtree::department(d.id.clone(), &d.title))
            .collect();

        let abonents = self
            .abonents
            .iter()
            .filter(|a| &a.department == id)
            .map(AbonentRecord::to_abonent)
            .collect();

        Ok(Subtree {
            id: Some(id.clone()),
            title: Some(title),
            show: None,
            departments,
            abonents,
        })
    }

    /// The sparse path tree for `query`. No match gives an empty tree.
    pub fn find(&self, query: &str) -> Result<Subtree, FetchError> {
        let needle = query.to_lowercase();
        let mut tree = Subtree::default();
        let mut matched = 0usize;

        for abonent in self.abonents.iter().filter(|a| a.matches(&needle)) {
            let Some(path) = self.path_to(&abonent.department) else {
                continue;
            };
            self.attach(&mut tree, &path, &abonent.id)?;
            matched += 1;
        }

        tracing::debug!(query = %query, matched, "Directory search");
        Ok(tree)
    }

    /// Department chain from the root down to `department`, root included.
    ///
    /// `None` when the chain runs into an unknown department. A parent
    /// cycle is cut where it closes.
    fn path_to(&self, department: &NodeId) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(department.clone()).filter(|d| !d.is_root());

        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                tracing::warn!(department = %id, "Department parent cycle, cutting path");
                break;
            }
            if self.department(&id).is_none() {
                tracing::warn!(department = %id, "Abonent references unknown department");
                return None;
            }
            current = self.parent_of(&id).cloned();
            path.push(id);
        }

        path.push(NodeId::root());
        path.reverse();
        Some(path)
    }

    /// Merge one match into the tree. `path[0]` is `branch`'s own id.
    fn attach(&self, branch: &mut Subtree, path: &[NodeId], leaf: &NodeId) -> Result<(), FetchError> {
        let Some((own, rest)) = path.split_first() else {
            return Ok(());
        };

        // A level is filled with its full child lists the first time a
        // path passes through it.
        if branch.show.is_none() {
            let full = self.subtree(own)?;
            branch.id = full.id;
            branch.title = full.title;
            branch.departments = full.departments;
            branch.abonents = full.abonents;
            branch.show = Some(ShowSet::default());
        }
        let show = branch.show.get_or_insert_with(ShowSet::default);

        match rest.first() {
            Some(next) => {
                let Some(child) = branch
                    .departments
                    .iter_mut()
                    .find(|d| d.id.as_ref() == Some(next))
                else {
                    tracing::warn!(department = %next, "Path department missing from its parent");
                    return Ok(());
                };
                if !show.departments.contains(next) {
                    show.departments.push(next.clone());
                }
                self.attach(child, rest, leaf)
            }
            None => {
                if !show.abonents.contains(leaf) {
                    show.abonents.push(leaf.clone());
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl DataService for MemoryDirectory {
    async fn get(&self, id: &NodeId) -> Result<Subtree, FetchError> {
        self.subtree(id)
    }

    async fn search(&self, query: &str) -> Result<Subtree, FetchError> {
        self.find(query)
    }
}
