//! Phonebook client - terminal front end for the directory tree
//!
//! Wires the `phonebook-tree` session to a data source and a user surface:
//! - Configuration (TOML file, environment, CLI flags)
//! - Data services: HTTP against `phonebook/get_data`, or an in-memory
//!   directory loaded from a JSON fixture
//! - The single-task driver that executes fetches and feeds completions
//!   back into the session
//! - A ratatui terminal UI and a non-interactive print mode

pub mod app;
pub mod config;
pub mod directory;
pub mod http;
pub mod tui;

pub use app::{Completion, PhonebookApp};
pub use config::ClientConfig;
pub use directory::MemoryDirectory;
pub use http::HttpDataService;
