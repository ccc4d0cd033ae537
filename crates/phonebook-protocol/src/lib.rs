//! Phonebook protocol - wire types and request definitions
//!
//! Describes the JSON shapes exchanged with the directory endpoint
//! (`phonebook/get_data`): department sub-trees, abonent entries and the
//! sparse search result tree with its `show` annotations.

pub mod constants;
pub mod error;
pub mod identity;
pub mod messages;
pub mod types;

pub use constants::*;
pub use error::*;
pub use identity::*;
pub use messages::*;
pub use types::*;
