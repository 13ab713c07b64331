#![forbid(unsafe_code)]

use uuid::Uuid;

/// Key of the sentinel entry in the persisted record. Never a valid [`NodeId`].
pub const ROOT_KEY: &str = "root";

const MAX_NODE_ID_LEN: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    /// Prefix carried by generated ids. Kept so records stay readable by the
    /// older schema; nothing in this crate dispatches on it.
    pub fn id_prefix(self) -> &'static str {
        match self {
            NodeKind::Folder => "folder_",
            NodeKind::File => "file_",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn generate(kind: NodeKind) -> Self {
        Self(format!("{}{}", kind.id_prefix(), Uuid::new_v4()))
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, NodeIdError> {
        let value = value.into();
        validate_node_id(&value)?;
        Ok(Self(value))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeIdError {
    Empty,
    TooLong,
    Reserved,
    ContainsControl,
}

impl NodeIdError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "node id must not be empty",
            Self::TooLong => "node id is too long",
            Self::Reserved => "node id must not be the reserved root key",
            Self::ContainsControl => "node id contains control characters",
        }
    }
}

impl std::fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for NodeIdError {}

fn validate_node_id(value: &str) -> Result<(), NodeIdError> {
    if value.trim().is_empty() {
        return Err(NodeIdError::Empty);
    }
    if value.len() > MAX_NODE_ID_LEN {
        return Err(NodeIdError::TooLong);
    }
    if value == ROOT_KEY {
        return Err(NodeIdError::Reserved);
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(NodeIdError::ContainsControl);
    }
    Ok(())
}
