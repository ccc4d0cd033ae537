//! Contracts the core drives: the rendered tree and the error line.

use std::fmt;

use phonebook_protocol::{Abonent, NodeId, CONTAINER_PREFIX, ROOT_CONTAINER};

/// Address of a children container in the rendered tree.
///
/// Derived deterministically from the owning branch id (`collapse-<id>`);
/// the top-level list has its own fixed id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerRef(String);

impl ContainerRef {
    /// The container holding the top-level departments.
    pub fn root() -> Self {
        Self(ROOT_CONTAINER.to_string())
    }

    /// The children container of a branch. The directory root maps to the
    /// top-level list.
    pub fn of(id: &NodeId) -> Self {
        if id.is_root() {
            Self::root()
        } else {
            Self(format!("{}{}", CONTAINER_PREFIX, id))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_CONTAINER
    }

    /// Id of the branch owning this container, `None` for the root list.
    pub fn owner(&self) -> Option<NodeId> {
        self.0.strip_prefix(CONTAINER_PREFIX).map(NodeId::from)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The rendered tree, driven by the core.
///
/// Every operation is idempotent, and operations naming an id the view does
/// not hold are no-ops.
pub trait TreeView {
    /// Append a collapsed branch under `parent` and return its (empty)
    /// children container.
    fn create_branch(&mut self, parent: &ContainerRef, id: &NodeId, title: &str) -> ContainerRef;

    /// Append a leaf under `parent`.
    fn create_leaf(&mut self, parent: &ContainerRef, abonent: &Abonent);

    /// Open a branch: show its children container, mark its toggle expanded.
    fn expand(&mut self, id: &NodeId);

    fn collapse(&mut self, id: &NodeId);

    fn show(&mut self, id: &NodeId);

    fn hide(&mut self, id: &NodeId);

    /// Hide every node in the forest.
    fn hide_all(&mut self);

    /// Hide every item below `id`, leaving `id` itself alone.
    fn hide_descendants(&mut self, id: &NodeId);

    /// Show every node and collapse every branch.
    fn restore_all(&mut self);
}

/// Displays a single human-readable error message.
pub trait ErrorReporter {
    fn report_error(&mut self, message: &str);
}

/// Error line that keeps the most recent message.
#[derive(Debug, Default)]
pub struct ErrorBanner {
    message: Option<String>,
    reported: usize,
}

impl ErrorBanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The message currently on display.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Total number of errors reported this session.
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn clear(&mut self) {
        self.message = None;
    }
}

impl ErrorReporter for ErrorBanner {
    fn report_error(&mut self, message: &str) {
        self.message = Some(message.to_string());
        self.reported += 1;
    }
}
