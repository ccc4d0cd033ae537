/// Identifier of the directory root. Requesting it returns the top-level
/// departments.
pub const ROOT_ID: &str = "0";

/// Quiet period after the last keystroke before a search is issued.
pub const DEBOUNCE_MS: u64 = 500;

/// Minimum query length (in characters) that triggers a search.
pub const MIN_QUERY_LEN: usize = 3;

/// Path of the directory endpoint, relative to the service base URL.
pub const GET_DATA_PATH: &str = "phonebook/get_data";

/// Prefix of the children container id of a branch (`collapse-<id>`).
pub const CONTAINER_PREFIX: &str = "collapse-";

/// Id of the container holding the top-level departments.
pub const ROOT_CONTAINER: &str = "phonebook-list";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
