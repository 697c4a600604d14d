// File: engine/tests/common/fixtures/fake_tools.rs
//! In-process stand-ins for rsync and cp
//!
//! `FsMirror` replaces the destination contents with a fresh copy of the
//! source, so a file that was hardlinked from an older generation gets a
//! new inode instead of being written through. `HardlinkClone` links every
//! file like `cp -al`.

use async_trait::async_trait;
use engine::{CloneTool, EngineError, EngineResult, SyncTool, ToolOutput};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

fn io_error(path: &Path, e: std::io::Error) -> EngineError {
    EngineError::io(path, e)
}

fn is_excluded(name: &str, excludes: &[String]) -> bool {
    excludes.iter().any(|pattern| match pattern.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == pattern,
    })
}

fn copy_tree(from: &Path, to: &Path, excludes: &[String]) -> EngineResult<()> {
    let walker = WalkDir::new(from)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map_or(true, |name| !is_excluded(name, excludes))
        });

    for entry in walker {
        let entry = entry.map_err(|e| EngineError::Task(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| EngineError::Task(e.to_string()))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_error(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| io_error(&target, e))?;
        }
    }
    Ok(())
}

/// Mirror with delete, implemented with std::fs
#[derive(Default)]
pub struct FsMirror {
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FsMirror {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SyncTool for FsMirror {
    async fn mirror(&self, from: &Path, to: &Path, excludes: &[String]) -> EngineResult<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((from.to_path_buf(), to.to_path_buf()));

        for entry in fs::read_dir(to).map_err(|e| io_error(to, e))? {
            let path = entry.map_err(|e| io_error(to, e))?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path).map_err(|e| io_error(&path, e))?;
            } else {
                fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
            }
        }
        copy_tree(from, to, excludes)?;

        Ok(ToolOutput::default())
    }
}

/// Fails every call whose source path ends with `failing_source` (compared
/// by whole path components)
pub struct FailingMirror {
    pub inner: FsMirror,
    pub failing_source: PathBuf,
}

impl FailingMirror {
    pub fn shared(failing_source: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            inner: FsMirror::default(),
            failing_source: failing_source.into(),
        })
    }
}

#[async_trait]
impl SyncTool for FailingMirror {
    async fn mirror(&self, from: &Path, to: &Path, excludes: &[String]) -> EngineResult<ToolOutput> {
        if from.ends_with(&self.failing_source) {
            return Err(EngineError::CommandFailed {
                command: format!("fake-rsync {}", from.display()),
                exit_code: Some(23),
                output: "some files could not be transferred".to_string(),
            });
        }
        self.inner.mirror(from, to, excludes).await
    }
}

/// Never finishes; records the destination it was handed
#[derive(Default)]
pub struct StallingMirror {
    pub destination: Mutex<Option<PathBuf>>,
}

impl StallingMirror {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn destination(&self) -> Option<PathBuf> {
        self.destination.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncTool for StallingMirror {
    async fn mirror(&self, _from: &Path, to: &Path, _excludes: &[String]) -> EngineResult<ToolOutput> {
        *self.destination.lock().unwrap() = Some(to.to_path_buf());
        std::future::pending::<EngineResult<ToolOutput>>().await
    }
}

/// Hardlink clone like `cp -al`
#[derive(Default)]
pub struct HardlinkClone {
    pub calls: AtomicUsize,
}

impl HardlinkClone {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloneTool for HardlinkClone {
    async fn clone_tree(&self, from: &Path, to: &Path) -> EngineResult<ToolOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        for entry in WalkDir::new(from).min_depth(1) {
            let entry = entry.map_err(|e| EngineError::Task(e.to_string()))?;
            let relative = entry
                .path()
                .strip_prefix(from)
                .map_err(|e| EngineError::Task(e.to_string()))?;
            let target = to.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(|e| io_error(&target, e))?;
            } else {
                fs::hard_link(entry.path(), &target).map_err(|e| io_error(&target, e))?;
            }
        }

        Ok(ToolOutput::default())
    }
}
