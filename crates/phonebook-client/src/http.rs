//! HTTP implementation of [`DataService`] against `phonebook/get_data`.

use std::time::Duration;

use async_trait::async_trait;

use phonebook_protocol::{DataRequest, FetchError, NodeId, Subtree, GET_DATA_PATH};
use phonebook_tree::DataService;

/// Talks to the directory endpoint of the web application.
///
/// One `reqwest::Client` is shared by every request, so connections are
/// pooled across branch loads and searches.
#[derive(Clone)]
pub struct HttpDataService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDataService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint_url(base_url),
        })
    }

    /// Full URL of the directory endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &DataRequest) -> Result<Subtree, FetchError> {
        let (key, value) = request.query_pair();
        tracing::debug!(endpoint = %self.endpoint, request = %request, "GET");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[(key, value)])
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16(), &body));
        }

        Ok(Subtree::from_json(&body)?)
    }
}

#[async_trait]
impl DataService for HttpDataService {
    async fn get(&self, id: &NodeId) -> Result<Subtree, FetchError> {
        self.send(&DataRequest::Get(id.clone())).await
    }

    async fn search(&self, query: &str) -> Result<Subtree, FetchError> {
        self.send(&DataRequest::Search(query.to_string())).await
    }

    async fn fetch(&self, request: &DataRequest) -> Result<Subtree, FetchError> {
        self.send(request).await
    }
}

/// `<base_url>/phonebook/get_data`, tolerating a trailing slash on the base.
pub fn endpoint_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), GET_DATA_PATH)
}

/// Map a transport-level failure onto the fetch error taxonomy.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Unreachable(err.to_string())
    } else if err.is_body() || err.is_decode() {
        FetchError::Aborted
    } else {
        FetchError::Unknown {
            status: err.status().map(|s| s.as_u16()),
            detail: err.to_string(),
        }
    }
}
