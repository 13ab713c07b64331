#![forbid(unsafe_code)]

use super::ids::NodeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    UnknownId(NodeId),
    DuplicateId(NodeId),
    NotAFolder(NodeId),
    NotAFile(NodeId),
    NestedFolder {
        folder: NodeId,
        parent: NodeId,
    },
    /// `parent` is `None` for the root list.
    DanglingChild {
        parent: Option<NodeId>,
        child: NodeId,
    },
    MultipleParents(NodeId),
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownId(id) => write!(f, "unknown node id: {id}"),
            Self::DuplicateId(id) => write!(f, "node id already exists: {id}"),
            Self::NotAFolder(id) => write!(f, "node is not a folder: {id}"),
            Self::NotAFile(id) => write!(f, "node is not a file: {id}"),
            Self::NestedFolder { folder, parent } => {
                write!(f, "folder {folder} cannot be placed inside folder {parent}")
            }
            Self::DanglingChild { parent, child } => match parent {
                Some(parent) => write!(f, "folder {parent} references missing node {child}"),
                None => write!(f, "root references missing node {child}"),
            },
            Self::MultipleParents(id) => write!(f, "node {id} is listed under more than one parent"),
        }
    }
}

impl std::error::Error for TreeError {}
