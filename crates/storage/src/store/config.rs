#![forbid(unsafe_code)]

use super::StoreError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::UtcOffset;

pub const ENV_STORAGE_DIR: &str = "NOTETREE_STORAGE_DIR";
pub const ENV_DB_FILE: &str = "NOTETREE_DB_FILE";
pub const ENV_UTC_OFFSET_HOURS: &str = "NOTETREE_UTC_OFFSET_HOURS";

const DEFAULT_DB_FILE: &str = "notetree.db";
const DEFAULT_OFFSET_HOURS: i8 = 8;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct TreeStoreConfig {
    pub storage_dir: PathBuf,
    pub db_file_name: String,
    /// Offset used for the human-readable node timestamps.
    pub utc_offset: UtcOffset,
    pub busy_timeout: Duration,
}

impl TreeStoreConfig {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: storage_dir.as_ref().to_path_buf(),
            db_file_name: DEFAULT_DB_FILE.to_string(),
            utc_offset: default_offset(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(&self.db_file_name)
    }

    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let storage_dir = lookup(ENV_STORAGE_DIR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(StoreError::InvalidInput("NOTETREE_STORAGE_DIR is not set"))?;
        let mut config = Self::new(storage_dir.trim());

        if let Some(file) = lookup(ENV_DB_FILE) {
            let file = file.trim();
            if file.is_empty() || file.contains(['/', '\\']) {
                return Err(StoreError::InvalidInput(
                    "NOTETREE_DB_FILE must be a plain file name",
                ));
            }
            config.db_file_name = file.to_string();
        }

        if let Some(hours) = lookup(ENV_UTC_OFFSET_HOURS) {
            config.utc_offset = parse_offset_hours(&hours)?;
        }

        Ok(config)
    }
}

fn parse_offset_hours(raw: &str) -> Result<UtcOffset, StoreError> {
    let hours = raw
        .trim()
        .parse::<i8>()
        .map_err(|_| StoreError::InvalidInput("NOTETREE_UTC_OFFSET_HOURS must be an integer"))?;
    if !(-12..=14).contains(&hours) {
        return Err(StoreError::InvalidInput(
            "NOTETREE_UTC_OFFSET_HOURS is out of range",
        ));
    }
    UtcOffset::from_hms(hours, 0, 0)
        .map_err(|_| StoreError::InvalidInput("NOTETREE_UTC_OFFSET_HOURS is out of range"))
}

fn default_offset() -> UtcOffset {
    UtcOffset::from_hms(DEFAULT_OFFSET_HOURS, 0, 0).unwrap_or(UtcOffset::UTC)
}
