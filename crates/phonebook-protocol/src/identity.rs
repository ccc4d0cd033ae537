use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::ROOT_ID;

/// Identifier of a directory entry.
///
/// Departments and abonents share one id namespace. The server derives ids
/// from integer database keys, so both JSON strings and JSON integers are
/// accepted on input; output is always a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The directory root (`"0"`).
    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NodeIdVisitor;

        impl<'de> Visitor<'de> for NodeIdVisitor {
            type Value = NodeId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or integer node id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeId, E> {
                Ok(NodeId::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<NodeId, E> {
                Ok(NodeId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<NodeId, E> {
                Ok(NodeId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<NodeId, E> {
                Ok(NodeId(v.to_string()))
            }
        }

        deserializer.deserialize_any(NodeIdVisitor)
    }
}
