#![forbid(unsafe_code)]

use super::error::TreeError;
use super::ids::{NodeId, NodeKind};
use super::types::{FileInfo, FolderInfo, FolderNode, MenuEntry, Parent, TreeNode};
use std::collections::{BTreeMap, BTreeSet};

/// The whole navigation hierarchy: root's ordered children plus an id-keyed
/// node map. Root is not a node and has no metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileTree {
    root: Vec<NodeId>,
    nodes: BTreeMap<NodeId, TreeNode>,
}

/// What `remove_folder` took out of the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedFolder {
    pub info: FolderInfo,
    pub files: Vec<FileInfo>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a tree without checking invariants. Used when loading stored
    /// records, which are kept verbatim even if older writers left dangling ids.
    pub fn from_parts(root: Vec<NodeId>, nodes: impl IntoIterator<Item = TreeNode>) -> Self {
        let nodes = nodes
            .into_iter()
            .map(|node| (node.id().clone(), node))
            .collect();
        Self { root, nodes }
    }

    pub fn root_children(&self) -> &[NodeId] {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    pub fn folder(&self, id: &NodeId) -> Option<&FolderNode> {
        self.nodes.get(id).and_then(TreeNode::as_folder)
    }

    pub fn file(&self, id: &NodeId) -> Option<&FileInfo> {
        self.nodes.get(id).and_then(TreeNode::as_file)
    }

    pub fn kind_of(&self, id: &NodeId) -> Result<NodeKind, TreeError> {
        self.nodes
            .get(id)
            .map(TreeNode::kind)
            .ok_or_else(|| TreeError::UnknownId(id.clone()))
    }

    /// Inserts `node` and prepends its id to the parent's children (root when
    /// `parent` is `None`).
    pub fn insert(&mut self, node: TreeNode, parent: Option<&NodeId>) -> Result<(), TreeError> {
        let id = node.id().clone();
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        if let (TreeNode::Folder(_), Some(parent)) = (&node, parent) {
            return Err(TreeError::NestedFolder {
                folder: id,
                parent: parent.clone(),
            });
        }

        let children = match parent {
            None => &mut self.root,
            Some(parent_id) => match self.nodes.get_mut(parent_id) {
                Some(TreeNode::Folder(folder)) => &mut folder.children,
                Some(TreeNode::File(_)) => return Err(TreeError::NotAFolder(parent_id.clone())),
                None => return Err(TreeError::UnknownId(parent_id.clone())),
            },
        };
        children.insert(0, id.clone());
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Returns `false` when the stored name already equals `name`.
    pub fn rename(&mut self, id: &NodeId, name: &str) -> Result<bool, TreeError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownId(id.clone()))?;
        if node.name() == name {
            return Ok(false);
        }
        node.set_name(name.to_string());
        Ok(true)
    }

    pub fn touch(&mut self, id: &NodeId, modified_at: String) -> Result<(), TreeError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownId(id.clone()))?;
        node.set_modified_at(modified_at);
        Ok(())
    }

    /// Removes a file wherever it is listed; the caller does not need to know
    /// its parent.
    pub fn remove_file(&mut self, id: &NodeId) -> Result<FileInfo, TreeError> {
        match self.nodes.get(id) {
            Some(TreeNode::File(_)) => {}
            Some(TreeNode::Folder(_)) => return Err(TreeError::NotAFile(id.clone())),
            None => return Err(TreeError::UnknownId(id.clone())),
        }

        self.root.retain(|child| child != id);
        for node in self.nodes.values_mut() {
            if let TreeNode::Folder(folder) = node {
                folder.children.retain(|child| child != id);
            }
        }

        match self.nodes.remove(id) {
            Some(TreeNode::File(info)) => Ok(info),
            _ => Err(TreeError::UnknownId(id.clone())),
        }
    }

    /// Removes a folder, the entries of its direct children and every
    /// reference to any of them, including the folder's own one in root.
    pub fn remove_folder(&mut self, id: &NodeId) -> Result<RemovedFolder, TreeError> {
        let folder = match self.nodes.remove(id) {
            Some(TreeNode::Folder(folder)) => folder,
            Some(file @ TreeNode::File(_)) => {
                self.nodes.insert(id.clone(), file);
                return Err(TreeError::NotAFolder(id.clone()));
            }
            None => return Err(TreeError::UnknownId(id.clone())),
        };

        self.root.retain(|child| child != id);

        let mut files = Vec::with_capacity(folder.children.len());
        for child in &folder.children {
            if let Some(TreeNode::File(info)) = self.nodes.remove(child) {
                files.push(info);
            }
        }

        // Older records may list a file under root as well as in the folder.
        let gone: BTreeSet<&NodeId> = files.iter().map(|file| &file.id).collect();
        self.root.retain(|child| !gone.contains(child));
        for node in self.nodes.values_mut() {
            if let TreeNode::Folder(other) = node {
                other.children.retain(|child| !gone.contains(child));
            }
        }

        Ok(RemovedFolder {
            info: folder.info,
            files,
        })
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<Parent> {
        if self.root.contains(id) {
            return Some(Parent::Root);
        }
        self.nodes.values().find_map(|node| match node {
            TreeNode::Folder(folder) if folder.children.contains(id) => {
                Some(Parent::Folder(folder.info.id.clone()))
            }
            _ => None,
        })
    }

    /// Navigation rows in display order. Ids that no longer resolve are skipped.
    pub fn menu(&self) -> Vec<MenuEntry<'_>> {
        self.root
            .iter()
            .filter_map(|id| match self.nodes.get(id)? {
                TreeNode::Folder(folder) => Some(MenuEntry::Folder {
                    info: &folder.info,
                    files: folder
                        .children
                        .iter()
                        .filter_map(|child| self.file(child))
                        .collect(),
                }),
                TreeNode::File(file) => Some(MenuEntry::File(file)),
            })
            .collect()
    }

    pub fn dangling_references(&self) -> Vec<(Parent, NodeId)> {
        self.child_lists()
            .flat_map(|(parent, children)| {
                children
                    .iter()
                    .filter(move |child| !self.nodes.contains_key(*child))
                    .map(move |child| (parent.clone(), child.clone()))
            })
            .collect()
    }

    /// Checks every structural invariant of the hierarchy.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut seen = BTreeSet::new();
        for (parent, children) in self.child_lists() {
            for child in children {
                let Some(node) = self.nodes.get(child) else {
                    return Err(TreeError::DanglingChild {
                        parent: match parent {
                            Parent::Root => None,
                            Parent::Folder(id) => Some(id),
                        },
                        child: child.clone(),
                    });
                };
                if let (Parent::Folder(parent_id), TreeNode::Folder(_)) = (&parent, node) {
                    return Err(TreeError::NestedFolder {
                        folder: child.clone(),
                        parent: parent_id.clone(),
                    });
                }
                if !seen.insert(child) {
                    return Err(TreeError::MultipleParents(child.clone()));
                }
            }
        }
        Ok(())
    }

    fn child_lists(&self) -> impl Iterator<Item = (Parent, &[NodeId])> {
        std::iter::once((Parent::Root, self.root.as_slice())).chain(
            self.nodes.values().filter_map(|node| {
                node.as_folder().map(|folder| {
                    (
                        Parent::Folder(folder.info.id.clone()),
                        folder.children.as_slice(),
                    )
                })
            }),
        )
    }
}
