#![forbid(unsafe_code)]

use super::*;
use notetree_core::{
    FileInfo, FileTree, FileType, FolderInfo, NodeId, NodeKind, Parent, RemovedFolder, TreeError,
    TreeNode,
};
use serde_json::{Value, json};

const DEFAULT_FOLDER_NAME: &str = "New Folder";
const EMPTY_BOARD_PAYLOAD: &str = "{}";

impl TreeStore {
    /// `None` both when the tree is absent and when `id` is unknown.
    pub fn get_node(&self, id: &NodeId) -> Result<Option<TreeNode>, StoreError> {
        Ok(self.get_tree()?.and_then(|tree| tree.node(id).cloned()))
    }

    pub fn get_file(&self, id: &NodeId) -> Result<Option<FileInfo>, StoreError> {
        Ok(self.get_tree()?.and_then(|tree| tree.file(id).cloned()))
    }

    pub fn parent_of(&self, id: &NodeId) -> Result<Option<Parent>, StoreError> {
        Ok(self.get_tree()?.and_then(|tree| tree.parent_of(id)))
    }

    pub fn add_folder(&self, name: Option<&str>) -> Result<FolderInfo, StoreError> {
        let now = self.clock.now_display();
        let info = FolderInfo {
            id: NodeId::generate(NodeKind::Folder),
            name: name
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_FOLDER_NAME)
                .to_string(),
            created_at: now.clone(),
            modified_at: now,
        };

        let node = TreeNode::from(info.clone());
        self.mutate_tree(|tree| {
            tree.insert(node, None)?;
            Ok(TreeWrite::Changed(()))
        })?;

        self.emit("create_folder", folder_payload(&info));
        Ok(info)
    }

    /// Creates the content object first, then the tree entry, so the tree never
    /// points at content that does not exist. `parent` of `None` means root.
    pub fn add_file(
        &self,
        name: Option<&str>,
        file_type: FileType,
        parent: Option<&NodeId>,
    ) -> Result<FileInfo, StoreError> {
        if let Some(parent) = parent {
            self.ensure_folder(parent)?;
        }

        let id = NodeId::generate(NodeKind::File);
        match file_type {
            FileType::Note => self.content.create_page(&id)?,
            FileType::Board => self.content.create_board(&id, EMPTY_BOARD_PAYLOAD)?,
        }

        let now = self.clock.now_display();
        let info = FileInfo {
            id,
            name: name.unwrap_or_default().to_string(),
            file_type,
            created_at: now.clone(),
            modified_at: now,
        };

        let node = TreeNode::from(info.clone());
        let inserted = self.mutate_tree(|tree| {
            tree.insert(node, parent)?;
            Ok(TreeWrite::Changed(()))
        });
        if let Err(err) = inserted {
            if let Err(cleanup) = self.delete_content(&info) {
                tracing::warn!(file = %info.id, error = %cleanup, "orphaned content after failed insert");
            }
            return Err(err);
        }

        self.emit(&format!("create_{}", file_type.as_str()), file_payload(&info));
        Ok(info)
    }

    /// Returns `false` without writing when the stored name already equals
    /// `name`; `file` is only used for its id. Notes also get their page title
    /// updated before the tree is written.
    pub fn update_file_name(&self, file: &FileInfo, name: &str) -> Result<bool, StoreError> {
        self.mutate_tree(|tree| {
            let Some(stored) = tree.file(&file.id) else {
                return Err(not_a(tree, &file.id, NodeKind::File));
            };
            let retitle = stored.file_type == FileType::Note && stored.name != name;
            if retitle {
                self.content.update_page_title(&file.id, name)?;
            }
            if tree.rename(&file.id, name)? {
                Ok(TreeWrite::Changed(true))
            } else {
                Ok(TreeWrite::Unchanged(false))
            }
        })
    }

    pub fn update_folder_name(&self, folder: &FolderInfo, name: &str) -> Result<bool, StoreError> {
        self.mutate_tree(|tree| {
            if tree.folder(&folder.id).is_none() {
                return Err(not_a(tree, &folder.id, NodeKind::Folder));
            }
            if tree.rename(&folder.id, name)? {
                Ok(TreeWrite::Changed(true))
            } else {
                Ok(TreeWrite::Unchanged(false))
            }
        })
    }

    /// Stamps a content change; renames never touch `modified_at`.
    pub fn update_file_gmt_modified(&self, file: &FileInfo) -> Result<FileInfo, StoreError> {
        let now = self.clock.now_display();
        self.mutate_tree(|tree| {
            if tree.file(&file.id).is_none() {
                return Err(not_a(tree, &file.id, NodeKind::File));
            }
            tree.touch(&file.id, now)?;
            let updated = tree
                .file(&file.id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    id: file.id.clone(),
                })?;
            Ok(TreeWrite::Changed(updated))
        })
    }

    /// Removes the file from whichever list holds it, then its content. The
    /// event is emitted once the tree write committed, even when the content
    /// delete fails.
    pub fn delete_file(&self, id: &NodeId) -> Result<FileInfo, StoreError> {
        let removed = self.mutate_tree(|tree| Ok(TreeWrite::Changed(tree.remove_file(id)?)))?;

        let content = self.delete_content(&removed);
        self.emit(
            &format!("delete_{}", removed.file_type.as_str()),
            file_payload(&removed),
        );
        content?;
        Ok(removed)
    }

    /// Removes the folder, its files and its entry in root. Content of every
    /// removed file is deleted; the first content failure is reported after
    /// all deletions were attempted.
    pub fn delete_folder(&self, id: &NodeId) -> Result<RemovedFolder, StoreError> {
        let removed = self.mutate_tree(|tree| Ok(TreeWrite::Changed(tree.remove_folder(id)?)))?;

        let mut first_failure = None;
        for file in &removed.files {
            if let Err(err) = self.delete_content(file) {
                tracing::warn!(file = %file.id, error = %err, "content delete failed");
                first_failure.get_or_insert(err);
            }
        }

        self.emit("delete_folder", json!({ "id": id.as_str() }));

        match first_failure {
            Some(err) => Err(err.into()),
            None => Ok(removed),
        }
    }

    fn ensure_folder(&self, id: &NodeId) -> Result<(), StoreError> {
        let tree = self.get_tree()?.unwrap_or_default();
        match tree.kind_of(id)? {
            NodeKind::Folder => Ok(()),
            NodeKind::File => Err(TreeError::NotAFolder(id.clone()).into()),
        }
    }

    fn delete_content(&self, file: &FileInfo) -> Result<(), CollaboratorError> {
        match file.file_type {
            FileType::Note => self.content.delete_page(&file.id),
            FileType::Board => self.content.delete_board(&file.id),
        }
    }

    fn emit(&self, event: &str, payload: Value) {
        if let Err(err) = self.telemetry.emit(event, payload) {
            tracing::warn!(event, error = %err, "telemetry emit failed");
        }
    }
}

fn not_a(tree: &FileTree, id: &NodeId, expected: NodeKind) -> StoreError {
    match (tree.kind_of(id), expected) {
        (Err(err), _) => err.into(),
        (Ok(_), NodeKind::File) => TreeError::NotAFile(id.clone()).into(),
        (Ok(_), NodeKind::Folder) => TreeError::NotAFolder(id.clone()).into(),
    }
}

fn folder_payload(info: &FolderInfo) -> Value {
    json!({
        "id": info.id.as_str(),
        "name": info.name,
        "gmtCreate": info.created_at,
        "gmtModified": info.modified_at,
    })
}

fn file_payload(info: &FileInfo) -> Value {
    json!({
        "id": info.id.as_str(),
        "name": info.name,
        "type": info.file_type.as_str(),
        "gmtCreate": info.created_at,
        "gmtModified": info.modified_at,
    })
}
