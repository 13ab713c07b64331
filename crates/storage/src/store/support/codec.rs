#![forbid(unsafe_code)]

use super::super::{StorageFailure, StoreError};
use notetree_core::{
    FileInfo, FileTree, FileType, FolderInfo, FolderNode, NodeId, ROOT_KEY, TreeNode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
struct WireItem {
    index: String,
    #[serde(rename = "isFolder", default)]
    is_folder: bool,
    #[serde(default)]
    data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    file_type: Option<String>,
    #[serde(rename = "gmtCreate", default)]
    created_at: String,
    #[serde(rename = "gmtModified", default)]
    modified_at: String,
}

/// Encodes `tree` in the persisted record format. When `previous` holds the
/// record being replaced, `data` fields this codec does not model are carried
/// over from it, and so is root's `data`.
pub(in crate::store) fn encode_tree(
    tree: &FileTree,
    previous: Option<&str>,
) -> Result<String, StoreError> {
    let mut previous: BTreeMap<String, WireItem> = match previous {
        Some(raw) => serde_json::from_str(raw)?,
        None => BTreeMap::new(),
    };

    let root_data = previous
        .remove(ROOT_KEY)
        .map(|item| item.data)
        .filter(|data| !data.is_null())
        .unwrap_or_else(|| Value::String(ROOT_KEY.to_string()));

    let mut items = BTreeMap::new();
    items.insert(
        ROOT_KEY.to_string(),
        WireItem {
            index: ROOT_KEY.to_string(),
            is_folder: true,
            data: root_data,
            children: Some(id_strings(tree.root_children())),
        },
    );

    for node in tree.nodes() {
        let earlier = previous.remove(node.id().as_str()).map(|item| item.data);
        let item = match node {
            TreeNode::Folder(folder) => WireItem {
                index: folder.info.id.as_str().to_string(),
                is_folder: true,
                data: merge_data(
                    earlier,
                    WireData {
                        id: folder.info.id.as_str().to_string(),
                        name: folder.info.name.clone(),
                        file_type: None,
                        created_at: folder.info.created_at.clone(),
                        modified_at: folder.info.modified_at.clone(),
                    },
                )?,
                children: Some(id_strings(&folder.children)),
            },
            TreeNode::File(file) => WireItem {
                index: file.id.as_str().to_string(),
                is_folder: false,
                data: merge_data(
                    earlier,
                    WireData {
                        id: file.id.as_str().to_string(),
                        name: file.name.clone(),
                        file_type: Some(file.file_type.as_str().to_string()),
                        created_at: file.created_at.clone(),
                        modified_at: file.modified_at.clone(),
                    },
                )?,
                children: None,
            },
        };
        items.insert(item.index.clone(), item);
    }

    Ok(serde_json::to_string(&items)?)
}

fn merge_data(earlier: Option<Value>, data: WireData) -> Result<Value, StoreError> {
    match (earlier, serde_json::to_value(data)?) {
        (Some(Value::Object(mut merged)), Value::Object(known)) => {
            merged.extend(known);
            Ok(Value::Object(merged))
        }
        (_, known) => Ok(known),
    }
}

/// Decodes a stored record. Dangling ids are kept as found.
pub(in crate::store) fn decode_tree(raw: &str) -> Result<FileTree, StoreError> {
    let items: BTreeMap<String, WireItem> = serde_json::from_str(raw)?;

    let mut root = Vec::new();
    let mut nodes = Vec::with_capacity(items.len());
    for (key, item) in items {
        if key == ROOT_KEY {
            root = parse_ids(item.children.unwrap_or_default())?;
            continue;
        }

        let id = parse_id(key)?;
        let data: WireData = match item.data {
            Value::Null => WireData::default(),
            value => serde_json::from_value(value)?,
        };

        if item.is_folder {
            nodes.push(TreeNode::Folder(FolderNode {
                info: FolderInfo {
                    id,
                    name: data.name,
                    created_at: data.created_at,
                    modified_at: data.modified_at,
                },
                children: parse_ids(item.children.unwrap_or_default())?,
            }));
            continue;
        }

        if item.children.as_ref().is_some_and(|children| !children.is_empty()) {
            tracing::warn!(file = %id, "dropping children listed on a file entry");
        }
        let file_type = match data.file_type.as_deref() {
            None => FileType::Note,
            Some(raw) => FileType::parse(raw).ok_or_else(|| {
                StoreError::StorageUnavailable(StorageFailure::Corrupt(format!(
                    "unknown file type {raw:?} for {id}"
                )))
            })?,
        };
        nodes.push(TreeNode::File(FileInfo {
            id,
            name: data.name,
            file_type,
            created_at: data.created_at,
            modified_at: data.modified_at,
        }));
    }

    Ok(FileTree::from_parts(root, nodes))
}

fn id_strings(ids: &[NodeId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_string()).collect()
}

fn parse_ids(raw: Vec<String>) -> Result<Vec<NodeId>, StoreError> {
    raw.into_iter().map(parse_id).collect()
}

fn parse_id(raw: String) -> Result<NodeId, StoreError> {
    NodeId::try_new(raw).map_err(|err| {
        StoreError::StorageUnavailable(StorageFailure::Corrupt(err.message().to_string()))
    })
}
