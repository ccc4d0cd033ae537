use thiserror::Error;

/// Failure of a directory request.
///
/// Failures are never fatal to the session: the tree is left untouched and
/// the message from [`FetchError::user_message`] is shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    #[error("Not found (404)")]
    NotFound,

    #[error("Server error (500)")]
    ServerError,

    #[error("Response parse failed: {0}")]
    Parse(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request aborted")]
    Aborted,

    #[error("Unexpected response (status {status:?}): {detail}")]
    Unknown { status: Option<u16>, detail: String },
}

impl FetchError {
    /// Classify a non-success HTTP status. Status 0 means no response at all.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            0 => FetchError::Unreachable("no response".to_string()),
            404 => FetchError::NotFound,
            500 => FetchError::ServerError,
            _ => FetchError::Unknown {
                status: Some(status),
                detail: body.to_string(),
            },
        }
    }

    /// The one-line message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Unreachable(_) => "Not connect. Verify Network.".to_string(),
            FetchError::NotFound => "Requested page not found (404).".to_string(),
            FetchError::ServerError => "Internal Server Error (500).".to_string(),
            FetchError::Parse(_) => "Requested JSON parse failed.".to_string(),
            FetchError::Timeout => "Time out error.".to_string(),
            FetchError::Aborted => "Ajax request aborted.".to_string(),
            FetchError::Unknown { detail, .. } => format!("Uncaught Error. {}", detail),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
