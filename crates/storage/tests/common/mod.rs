#![forbid(unsafe_code)]
#![allow(dead_code)]

use notetree_core::{FileTree, NodeId};
use notetree_storage::{
    CollaboratorError, ContentStore, LegacyTree, LegacyTreeSource, TelemetrySink, TreeStore,
    TreeStoreConfig,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("notetree_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[derive(Default)]
pub struct MemoryContent {
    pages: Mutex<BTreeSet<String>>,
    boards: Mutex<BTreeMap<String, String>>,
    titles: Mutex<BTreeMap<String, String>>,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    pub panic_on_title: AtomicBool,
    pub delete_attempts: AtomicUsize,
}

impl MemoryContent {
    pub fn has_page(&self, id: &NodeId) -> bool {
        self.pages.lock().unwrap().contains(id.as_str())
    }

    pub fn board_payload(&self, id: &NodeId) -> Option<String> {
        self.boards.lock().unwrap().get(id.as_str()).cloned()
    }

    pub fn title(&self, id: &NodeId) -> Option<String> {
        self.titles.lock().unwrap().get(id.as_str()).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.pages.lock().unwrap().len() + self.boards.lock().unwrap().len()
    }

    fn check(&self, flag: &AtomicBool, what: &str) -> Result<(), CollaboratorError> {
        if flag.load(Ordering::SeqCst) {
            Err(CollaboratorError::new(format!("{what} unavailable")))
        } else {
            Ok(())
        }
    }
}

impl ContentStore for MemoryContent {
    fn create_page(&self, id: &NodeId) -> Result<(), CollaboratorError> {
        self.check(&self.fail_create, "create")?;
        self.pages.lock().unwrap().insert(id.as_str().to_string());
        Ok(())
    }

    fn create_board(&self, id: &NodeId, initial_payload: &str) -> Result<(), CollaboratorError> {
        self.check(&self.fail_create, "create")?;
        self.boards
            .lock()
            .unwrap()
            .insert(id.as_str().to_string(), initial_payload.to_string());
        Ok(())
    }

    fn delete_page(&self, id: &NodeId) -> Result<(), CollaboratorError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_delete, "delete")?;
        self.pages.lock().unwrap().remove(id.as_str());
        Ok(())
    }

    fn delete_board(&self, id: &NodeId) -> Result<(), CollaboratorError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_delete, "delete")?;
        self.boards.lock().unwrap().remove(id.as_str());
        Ok(())
    }

    fn update_page_title(&self, id: &NodeId, title: &str) -> Result<(), CollaboratorError> {
        if self.panic_on_title.load(Ordering::SeqCst) {
            panic!("page title update crashed");
        }
        self.titles
            .lock()
            .unwrap()
            .insert(id.as_str().to_string(), title.to_string());
        Ok(())
    }
}

pub struct CountingLegacy {
    tree: Option<FileTree>,
    fail: bool,
    pub reads: AtomicUsize,
}

impl CountingLegacy {
    pub fn with_tree(tree: FileTree) -> Self {
        Self {
            tree: Some(tree),
            fail: false,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            tree: None,
            fail: true,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl LegacyTreeSource for CountingLegacy {
    fn read_legacy_tree(&self) -> Result<Option<LegacyTree>, CollaboratorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CollaboratorError::new("legacy database is unreadable"));
        }
        Ok(self.tree.clone().map(LegacyTree::from))
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<(String, Value)>>,
    pub fail: AtomicBool,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn emit(&self, event: &str, payload: Value) -> Result<(), CollaboratorError> {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload));
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("telemetry endpoint down"));
        }
        Ok(())
    }
}

pub struct Harness {
    pub store: TreeStore,
    pub content: Arc<MemoryContent>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub dir: PathBuf,
}

pub fn harness(test_name: &str) -> Harness {
    let dir = temp_dir(test_name);
    harness_in(dir)
}

pub fn harness_in(dir: PathBuf) -> Harness {
    let content = Arc::new(MemoryContent::default());
    let telemetry = Arc::new(RecordingTelemetry::default());
    let store = TreeStore::new(TreeStoreConfig::new(&dir), content.clone())
        .with_telemetry(telemetry.clone());
    Harness {
        store,
        content,
        telemetry,
        dir,
    }
}
