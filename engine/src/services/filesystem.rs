// File: engine/src/services/filesystem.rs
use std::fs::File;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::errors::{EngineError, EngineResult};

pub async fn exists(path: &Path) -> EngineResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| EngineError::io(path, e))
}

pub async fn create_directory(path: &Path) -> EngineResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| EngineError::io(path, e))
}

/// Remove a directory tree, or a single file/symlink if that is what sits at `path`
pub async fn remove_path(path: &Path) -> EngineResult<()> {
    let metadata = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|e| EngineError::io(path, e))?;
    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    result.map_err(|e| EngineError::io(path, e))
}

/// Set the modification (and access) time of a file or directory to now
pub async fn touch(path: &Path) -> EngineResult<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let now = SystemTime::now();
        File::open(&path)
            .and_then(|file| file.set_modified(now))
            .map_err(|e| EngineError::io(&path, e))
    })
    .await?
}

/// Total bytes of all non-directory entries under `root`, symlinks not followed
pub async fn tree_size(root: &Path) -> EngineResult<u64> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || walk_size(&root)).await?
}

fn walk_size(root: &Path) -> EngineResult<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            EngineError::io(path, e.into())
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let metadata = entry
            .metadata()
            .map_err(|e| EngineError::io(entry.path(), e.into()))?;
        total += metadata.len();
    }
    Ok(total)
}
