#![forbid(unsafe_code)]

use super::ids::{NodeId, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    Note,
    Board,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Note => "note",
            FileType::Board => "board",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "note" => Some(FileType::Note),
            "board" => Some(FileType::Board),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderInfo {
    pub id: NodeId,
    pub name: String,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub id: NodeId,
    pub name: String,
    pub file_type: FileType,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderNode {
    pub info: FolderInfo,
    /// Newest first.
    pub children: Vec<NodeId>,
}

impl FolderNode {
    pub fn new(info: FolderInfo) -> Self {
        Self {
            info,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeNode {
    Folder(FolderNode),
    File(FileInfo),
}

impl TreeNode {
    pub fn id(&self) -> &NodeId {
        match self {
            TreeNode::Folder(folder) => &folder.info.id,
            TreeNode::File(file) => &file.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TreeNode::Folder(_) => NodeKind::Folder,
            TreeNode::File(_) => NodeKind::File,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::Folder(folder) => &folder.info.name,
            TreeNode::File(file) => &file.name,
        }
    }

    /// Name to render; stored names may legitimately be empty.
    pub fn display_name<'a>(&'a self, placeholder: &'a str) -> &'a str {
        let name = self.name();
        if name.trim().is_empty() {
            placeholder
        } else {
            name
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match self {
            TreeNode::Folder(folder) => &folder.children,
            TreeNode::File(_) => &[],
        }
    }

    pub(super) fn set_name(&mut self, name: String) {
        match self {
            TreeNode::Folder(folder) => folder.info.name = name,
            TreeNode::File(file) => file.name = name,
        }
    }

    pub(super) fn set_modified_at(&mut self, modified_at: String) {
        match self {
            TreeNode::Folder(folder) => folder.info.modified_at = modified_at,
            TreeNode::File(file) => file.modified_at = modified_at,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            TreeNode::Folder(folder) => Some(folder),
            TreeNode::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileInfo> {
        match self {
            TreeNode::Folder(_) => None,
            TreeNode::File(file) => Some(file),
        }
    }
}

impl From<FolderInfo> for TreeNode {
    fn from(info: FolderInfo) -> Self {
        TreeNode::Folder(FolderNode::new(info))
    }
}

impl From<FileInfo> for TreeNode {
    fn from(info: FileInfo) -> Self {
        TreeNode::File(info)
    }
}

/// Location of a node inside the two-level hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Parent {
    Root,
    Folder(NodeId),
}

/// One row of the navigation pane, in display order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuEntry<'a> {
    Folder {
        info: &'a FolderInfo,
        files: Vec<&'a FileInfo>,
    },
    File(&'a FileInfo),
}
