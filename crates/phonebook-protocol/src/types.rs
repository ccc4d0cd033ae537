use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::NodeId;

/// A person entry (leaf of the directory tree).
///
/// Every field tolerates being absent or `null` so one broken entry never
/// fails the whole payload. Entries without an `id` are skipped when the
/// tree is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abonent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub surname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patronymic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rank: String,
    /// Short internal numbers.
    #[serde(default, deserialize_with = "null_as_default")]
    pub extension: Vec<String>,
    /// City numbers.
    #[serde(default, deserialize_with = "null_as_default")]
    pub landline: Vec<String>,
}

impl Abonent {
    pub fn new(id: impl Into<NodeId>, surname: &str, name: &str, patronymic: &str) -> Self {
        Self {
            id: Some(id.into()),
            surname: surname.to_string(),
            name: name.to_string(),
            patronymic: patronymic.to_string(),
            ..Default::default()
        }
    }

    pub fn with_post(mut self, post: &str) -> Self {
        self.post = post.to_string();
        self
    }

    pub fn with_phones(mut self, extension: &[&str], landline: &[&str]) -> Self {
        self.extension = extension.iter().map(|s| s.to_string()).collect();
        self.landline = landline.iter().map(|s| s.to_string()).collect();
        self
    }

    /// "Surname Name Patronymic", skipping empty parts.
    pub fn full_name(&self) -> String {
        [&self.surname, &self.name, &self.patronymic]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Children of a search-result level that lie on a path to a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSet {
    /// Departments to keep open.
    #[serde(default, deserialize_with = "null_as_default")]
    pub departments: Vec<NodeId>,
    /// Abonents to reveal.
    #[serde(default, deserialize_with = "null_as_default")]
    pub abonents: Vec<NodeId>,
}

impl ShowSet {
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty() && self.abonents.is_empty()
    }
}

/// A department together with (some of) its children.
///
/// The same shape serves three purposes:
/// - the response to `get=<id>`: the requested department with its direct
///   children, where child departments carry only `id` and `title`;
/// - a child department entry inside such a response;
/// - a level of the sparse search result tree, where `show` names the
///   children on a path to a match and the children listed in `show`
///   carry their own children recursively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<ShowSet>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub departments: Vec<Subtree>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub abonents: Vec<Abonent>,
}

impl Subtree {
    /// A department entry with no children attached.
    pub fn department(id: impl Into<NodeId>, title: &str) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    pub fn with_departments(mut self, departments: Vec<Subtree>) -> Self {
        self.departments = departments;
        self
    }

    pub fn with_abonents(mut self, abonents: Vec<Abonent>) -> Self {
        self.abonents = abonents;
        self
    }

    pub fn with_show(mut self, departments: &[&str], abonents: &[&str]) -> Self {
        self.show = Some(ShowSet {
            departments: departments.iter().map(|id| NodeId::from(*id)).collect(),
            abonents: abonents.iter().map(|id| NodeId::from(*id)).collect(),
        });
        self
    }

    /// Parse a response body. A `null` body is an empty sub-tree.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let parsed: Option<Subtree> = serde_json::from_str(body)?;
        Ok(parsed.unwrap_or_default())
    }

    /// True when there is nothing to render below this level.
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty() && self.abonents.is_empty()
    }

    /// Whether `id` is a department on a matched path at this level.
    pub fn shows_department(&self, id: &NodeId) -> bool {
        self.show
            .as_ref()
            .is_some_and(|show| show.departments.contains(id))
    }

    /// Whether `id` is a matched abonent at this level.
    pub fn shows_abonent(&self, id: &NodeId) -> bool {
        self.show
            .as_ref()
            .is_some_and(|show| show.abonents.contains(id))
    }

    /// Find a direct child department by id.
    pub fn child(&self, id: &NodeId) -> Option<&Subtree> {
        self.departments
            .iter()
            .find(|dep| dep.id.as_ref() == Some(id))
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
