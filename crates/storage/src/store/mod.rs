#![forbid(unsafe_code)]

mod collaborators;
mod config;
mod error;
mod support;
mod tree_ops;

pub use collaborators::*;
pub use config::*;
pub use error::{StorageFailure, StoreError};

use notetree_core::FileTree;
use rusqlite::{Connection, TransactionBehavior};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use support::{
    Clock, decode_tree, encode_tree, install_schema, preflight_gate, read_record,
    record_revision, write_record_tx,
};

/// Tree storage engine. Construct once and share it (for example behind an
/// `Arc`); every operation goes through the same lazily opened connection.
pub struct TreeStore {
    config: TreeStoreConfig,
    clock: Clock,
    conn: Mutex<Option<Connection>>,
    /// Set the first time the store looks for a current record: either one
    /// exists, or the legacy source has been consulted (successfully or not).
    migration_attempted: AtomicBool,
    content: Arc<dyn ContentStore>,
    legacy: Arc<dyn LegacyTreeSource>,
    telemetry: Arc<dyn TelemetrySink>,
}

/// Result of a mutation closure: whether the tree has to be written back.
enum TreeWrite<R> {
    Changed(R),
    Unchanged(R),
}

impl TreeStore {
    pub fn new(config: TreeStoreConfig, content: Arc<dyn ContentStore>) -> Self {
        Self {
            clock: Clock::new(config.utc_offset),
            config,
            conn: Mutex::new(None),
            migration_attempted: AtomicBool::new(false),
            content,
            legacy: Arc::new(NoLegacyTree),
            telemetry: Arc::new(TracingTelemetry),
        }
    }

    pub fn with_legacy_source(mut self, legacy: Arc<dyn LegacyTreeSource>) -> Self {
        self.legacy = legacy;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn migration_attempted(&self) -> bool {
        self.migration_attempted.load(Ordering::SeqCst)
    }

    /// Opens the underlying database if no handle exists yet. Safe to call any
    /// number of times; callers racing the first open wait for it.
    pub fn open(&self) -> Result<(), StoreError> {
        self.with_connection(|_| Ok(()))
    }

    /// Number of writes the tree record has seen; `0` when none exists.
    pub fn revision(&self) -> Result<i64, StoreError> {
        self.with_connection(|conn| record_revision(conn))
    }

    /// The whole tree, or `None` when neither a current nor a legacy tree exists.
    pub fn get_tree(&self) -> Result<Option<FileTree>, StoreError> {
        self.with_connection(|conn| Ok(self.load_or_migrate(conn)?.map(|(tree, _)| tree)))
    }

    fn with_connection<R>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        // A panicking collaborator unwinds through the open transaction, which
        // rolls back on drop; the connection itself is still usable.
        let mut guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let conn = match guard.take() {
            Some(conn) => conn,
            None => open_connection(&self.config)?,
        };
        f(guard.insert(conn))
    }

    fn load_or_migrate(
        &self,
        conn: &mut Connection,
    ) -> Result<Option<(FileTree, i64)>, StoreError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(record) = read_record(&tx)? {
            self.migration_attempted.store(true, Ordering::SeqCst);
            let tree = decode_tree(&record.value)?;
            return Ok(Some((tree, record.revision)));
        }

        if self.migration_attempted.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }

        let (legacy, raw) = match self.legacy.read_legacy_tree() {
            Ok(Some(found)) => found.into_parts(),
            Ok(None) => {
                tracing::debug!("no legacy file tree to migrate");
                return Ok(None);
            }
            Err(err) => {
                tracing::warn!(error = %err, "legacy file tree read failed; migration skipped");
                return Ok(None);
            }
        };

        let dangling = legacy.dangling_references();
        if !dangling.is_empty() {
            tracing::warn!(
                count = dangling.len(),
                "legacy file tree carries dangling references"
            );
        }

        let value = match raw {
            Some(raw) => raw,
            None => encode_tree(&legacy, None)?,
        };
        let revision = write_record_tx(&tx, 0, &value)?;
        tx.commit()?;
        tracing::info!(nodes = legacy.len(), revision, "migrated legacy file tree");
        Ok(Some((legacy, revision)))
    }

    /// Runs read, mutate and write of the tree as one immediate transaction
    /// while holding the connection, so concurrent mutations cannot lose updates.
    fn mutate_tree<R>(
        &self,
        apply: impl FnOnce(&mut FileTree) -> Result<TreeWrite<R>, StoreError>,
    ) -> Result<R, StoreError> {
        self.with_connection(|conn| {
            if !self.migration_attempted.load(Ordering::SeqCst) {
                self.load_or_migrate(conn)?;
            }

            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let previous = read_record(&tx)?;
            let (mut tree, revision) = match &previous {
                Some(record) => (decode_tree(&record.value)?, record.revision),
                None => (FileTree::new(), 0),
            };

            let value = match apply(&mut tree)? {
                TreeWrite::Unchanged(value) => return Ok(value),
                TreeWrite::Changed(value) => value,
            };

            let previous_value = previous.as_ref().map(|record| record.value.as_str());
            let encoded = encode_tree(&tree, previous_value)?;
            let revision = write_record_tx(&tx, revision, &encoded)?;
            tx.commit()?;
            tracing::debug!(revision, nodes = tree.len(), "file tree written");
            Ok(value)
        })
    }
}

impl std::fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore")
            .field("db_path", &self.config.db_path())
            .field("migration_attempted", &self.migration_attempted())
            .finish_non_exhaustive()
    }
}

fn open_connection(config: &TreeStoreConfig) -> Result<Connection, StoreError> {
    std::fs::create_dir_all(&config.storage_dir)?;

    let db_path = config.db_path();
    let conn = Connection::open(&db_path)?;
    conn.busy_timeout(config.busy_timeout)?;

    preflight_gate(&conn)?;
    install_schema(&conn)?;

    tracing::debug!(path = %db_path.display(), "tree store opened");
    Ok(conn)
}
