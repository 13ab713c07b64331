#![forbid(unsafe_code)]

use super::StoreError;
use super::support::decode_tree;
use notetree_core::{FileTree, NodeId};
use serde_json::Value;
use std::path::PathBuf;

/// Failure reported by a component the tree store delegates to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CollaboratorError {}

/// Owns note and board payloads, keyed by the same id as the tree node.
///
/// `update_page_title` runs while the store holds its connection lock, so an
/// implementation must not call back into the same `TreeStore`.
pub trait ContentStore: Send + Sync {
    fn create_page(&self, id: &NodeId) -> Result<(), CollaboratorError>;
    fn create_board(&self, id: &NodeId, initial_payload: &str) -> Result<(), CollaboratorError>;
    fn delete_page(&self, id: &NodeId) -> Result<(), CollaboratorError>;
    fn delete_board(&self, id: &NodeId) -> Result<(), CollaboratorError>;
    fn update_page_title(&self, id: &NodeId, title: &str) -> Result<(), CollaboratorError>;
}

/// A tree persisted by an older schema. When the source has the record text,
/// migration stores that text unchanged instead of re-encoding `tree`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTree {
    tree: FileTree,
    raw: Option<String>,
}

impl LegacyTree {
    pub fn from_record(raw: impl Into<String>) -> Result<Self, StoreError> {
        let raw = raw.into();
        let tree = decode_tree(&raw)?;
        Ok(Self {
            tree,
            raw: Some(raw),
        })
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn into_parts(self) -> (FileTree, Option<String>) {
        (self.tree, self.raw)
    }
}

impl From<FileTree> for LegacyTree {
    fn from(tree: FileTree) -> Self {
        Self { tree, raw: None }
    }
}

/// One-shot read of a tree persisted by an older schema. Called under the
/// store's connection lock, like `ContentStore::update_page_title`.
pub trait LegacyTreeSource: Send + Sync {
    fn read_legacy_tree(&self) -> Result<Option<LegacyTree>, CollaboratorError>;
}

/// Fire-and-forget usage events. Errors are logged and dropped by the store.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: &str, payload: Value) -> Result<(), CollaboratorError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoLegacyTree;

impl LegacyTreeSource for NoLegacyTree {
    fn read_legacy_tree(&self) -> Result<Option<LegacyTree>, CollaboratorError> {
        Ok(None)
    }
}

/// Legacy tree exported as a JSON document in the persisted record format.
#[derive(Clone, Debug)]
pub struct LegacyJsonFile {
    path: PathBuf,
}

impl LegacyJsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LegacyTreeSource for LegacyJsonFile {
    fn read_legacy_tree(&self) -> Result<Option<LegacyTree>, CollaboratorError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(CollaboratorError::new(format!(
                    "read {}: {err}",
                    self.path.display()
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        LegacyTree::from_record(raw)
            .map(Some)
            .map_err(|err| CollaboratorError::new(format!("decode {}: {err}", self.path.display())))
    }
}

/// Default sink: records events in the log stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn emit(&self, event: &str, payload: Value) -> Result<(), CollaboratorError> {
        tracing::info!(event, %payload, "telemetry");
        Ok(())
    }
}
