use std::fmt;

use crate::identity::NodeId;

/// A request to the directory endpoint.
///
/// Maps onto `GET phonebook/get_data?get=<id>` and
/// `GET phonebook/get_data?search=<query>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataRequest {
    /// Fetch a department with its direct children.
    Get(NodeId),
    /// Fetch the sparse path tree for a query.
    Search(String),
}

impl DataRequest {
    /// The single query-string pair carried by this request.
    pub fn query_pair(&self) -> (&'static str, &str) {
        match self {
            DataRequest::Get(id) => ("get", id.as_str()),
            DataRequest::Search(query) => ("search", query.as_str()),
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, DataRequest::Search(_))
    }
}

impl fmt::Display for DataRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (key, value) = self.query_pair();
        write!(f, "{}={}", key, value)
    }
}
