#![forbid(unsafe_code)]

use super::collaborators::CollaboratorError;
use notetree_core::{NodeId, TreeError};

/// Persistence layer could not be reached or its contents could not be trusted.
#[derive(Debug)]
pub enum StorageFailure {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    Corrupt(String),
    ResetRequired(&'static str),
}

impl std::fmt::Display for StorageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::Corrupt(message) => write!(f, "corrupt record: {message}"),
            Self::ResetRequired(message) => write!(f, "RESET_REQUIRED: {message}"),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    StorageUnavailable(StorageFailure),
    NotFound { id: NodeId },
    InvalidTree(TreeError),
    InvalidInput(&'static str),
    Content(CollaboratorError),
}

impl StoreError {
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(failure) => write!(f, "storage unavailable: {failure}"),
            Self::NotFound { id } => write!(f, "not found: {id}"),
            Self::InvalidTree(err) => write!(f, "invalid tree operation: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Content(err) => write!(f, "content store: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StorageUnavailable(StorageFailure::Io(err)) => Some(err),
            Self::StorageUnavailable(StorageFailure::Sql(err)) => Some(err),
            Self::InvalidTree(err) => Some(err),
            Self::Content(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::StorageUnavailable(StorageFailure::Io(value))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageUnavailable(StorageFailure::Sql(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::StorageUnavailable(StorageFailure::Corrupt(value.to_string()))
    }
}

impl From<TreeError> for StoreError {
    fn from(value: TreeError) -> Self {
        match value {
            TreeError::UnknownId(id) => Self::NotFound { id },
            other => Self::InvalidTree(other),
        }
    }
}

impl From<CollaboratorError> for StoreError {
    fn from(value: CollaboratorError) -> Self {
        Self::Content(value)
    }
}
