//! Filesystem data lake operations.
//!
//! Layout under the data directory:
//! - `corpus/` match records, the card reference table and rotation blocks
//! - `snapshots/<scope>/` one JSON file per snapshot plus `latest.json`

pub mod jsonl;
pub mod snapshots;

pub use jsonl::*;
pub use snapshots::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn corpus_dir(&self) -> PathBuf {
        self.data_dir.join("corpus")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    pub fn matches_path(&self) -> PathBuf {
        self.corpus_dir().join(CorpusFile::Matches.filename())
    }

    pub fn cards_path(&self) -> PathBuf {
        self.corpus_dir().join(CorpusFile::Cards.filename())
    }

    pub fn rotation_path(&self) -> PathBuf {
        self.corpus_dir().join("rotation.json")
    }

    /// Directory holding every snapshot of one scope.
    pub fn scope_dir(&self, scope_key: &str) -> PathBuf {
        self.snapshots_dir().join(scope_key)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
