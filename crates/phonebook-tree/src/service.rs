//! The directory data boundary.

use async_trait::async_trait;

use phonebook_protocol::{DataRequest, FetchError, NodeId, Subtree};

/// Source of directory payloads.
///
/// `get` returns a department with its direct children (`"0"` is the
/// root); `search` returns the sparse path tree for a query.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn get(&self, id: &NodeId) -> Result<Subtree, FetchError>;

    async fn search(&self, query: &str) -> Result<Subtree, FetchError>;

    /// Execute a request produced by a controller.
    async fn fetch(&self, request: &DataRequest) -> Result<Subtree, FetchError> {
        match request {
            DataRequest::Get(id) => self.get(id).await,
            DataRequest::Search(query) => self.search(query).await,
        }
    }
}
