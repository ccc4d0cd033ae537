//! Phonebook Tree - lazy-loaded directory tree state machine
//!
//! Holds every rule about the directory tree a user browses:
//! - Load-once bookkeeping per branch (NodeRegistry)
//! - Turning server payloads into rendered nodes (TreeBuilder)
//! - Opening branches and fetching their children on first open (ExpansionController)
//! - Debounced incremental search and reconciliation of the sparse result
//!   tree against the partially loaded view (SearchController)
//! - Returning to the collapsed, fully visible tree (ResetController)
//!
//! Controllers never perform I/O. They hand back `DataRequest`s and
//! `SearchTicket`s that a driver executes against a [`DataService`], and
//! take the completions back through the [`Session`].

pub mod builder;
pub mod expansion;
pub mod forest;
pub mod registry;
pub mod reset;
pub mod search;
pub mod service;
pub mod session;
pub mod view;

pub use builder::TreeBuilder;
pub use expansion::{BranchState, ExpansionController};
pub use forest::ForestView;
pub use registry::{NodeRegistry, NodeState};
pub use reset::ResetController;
pub use search::{SearchConfig, SearchController, SearchTicket};
pub use service::DataService;
pub use session::Session;
pub use view::{ContainerRef, ErrorBanner, ErrorReporter, TreeView};
