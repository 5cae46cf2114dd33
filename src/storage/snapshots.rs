//! Snapshot files.
//!
//! Every snapshot is written to `snapshots/<scope>/<id>.json`, and the most
//! recent one of each scope is mirrored to `snapshots/<scope>/latest.json`.
//! Files are written to a temporary sibling and renamed into place so a
//! reader never observes a half-written snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{StorageConfig, StorageError};
use crate::models::SnapshotScope;
use crate::snapshot::MetaSnapshot;

const LATEST_FILE: &str = "latest.json";

/// Path of a snapshot file by scope key and id.
pub fn snapshot_path(config: &StorageConfig, scope_key: &str, id: &str) -> PathBuf {
    config.scope_dir(scope_key).join(format!("{}.json", id))
}

/// Path of the latest snapshot of a scope.
pub fn latest_path(config: &StorageConfig, scope_key: &str) -> PathBuf {
    config.scope_dir(scope_key).join(LATEST_FILE)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let parent = path
        .parent()
        .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;
    fs::create_dir_all(parent)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Persist a snapshot and make it the latest of its scope.
pub fn write_snapshot(
    config: &StorageConfig,
    snapshot: &MetaSnapshot,
) -> Result<PathBuf, StorageError> {
    let scope_key = snapshot.scope.key();
    let json = serde_json::to_vec_pretty(snapshot)?;

    let path = snapshot_path(config, &scope_key, snapshot.id.as_str());
    write_atomic(&path, &json)?;
    write_atomic(&latest_path(config, &scope_key), &json)?;

    info!("Wrote snapshot {} to {:?}", snapshot.id, path);
    Ok(path)
}

fn read_snapshot_file(path: &Path) -> Result<Option<MetaSnapshot>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read(path)?;
    let snapshot = serde_json::from_slice(&contents)?;
    debug!("Read snapshot from {:?}", path);
    Ok(Some(snapshot))
}

/// Read the latest snapshot of a scope, if any was written.
pub fn read_latest_snapshot(
    config: &StorageConfig,
    scope: &SnapshotScope,
) -> Result<Option<MetaSnapshot>, StorageError> {
    read_snapshot_file(&latest_path(config, &scope.key()))
}

/// Read one snapshot by scope and id.
pub fn read_snapshot(
    config: &StorageConfig,
    scope: &SnapshotScope,
    id: &str,
) -> Result<Option<MetaSnapshot>, StorageError> {
    read_snapshot_file(&snapshot_path(config, &scope.key(), id))
}

/// Scopes with at least one stored snapshot, sorted by key.
pub fn list_scopes(config: &StorageConfig) -> Result<Vec<SnapshotScope>, StorageError> {
    let dir = config.snapshots_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if entry.path().join(LATEST_FILE).exists() {
                keys.push(name.to_string());
            }
        }
    }

    keys.sort();
    Ok(keys
        .iter()
        .filter_map(|key| SnapshotScope::from_key(key))
        .collect())
}
