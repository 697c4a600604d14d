// File: engine/src/types.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::errors::{EngineError, EngineResult};
use crate::naming::{self, GenerationName};
use crate::services::filesystem;

// === JOB DEFINITION ===

/// One source directory mirrored into a subdirectory of every generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryMapping {
    pub source: PathBuf,
    /// Relative to the generation root
    pub destination: PathBuf,
    pub excludes: Vec<String>,
}

impl DirectoryMapping {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            excludes: Vec::new(),
        }
    }

    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Layout used when no destination is configured: the source path
    /// without its root, so `/home/alice` lands in `home/alice`.
    pub fn default_destination(source: &Path) -> PathBuf {
        source
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect()
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !self.source.is_absolute() {
            return Err(EngineError::invalid_config(
                "src_dir_abspath",
                format!("'{}' is not an absolute path", self.source.display()),
            ));
        }

        let mut has_normal = false;
        for component in self.destination.components() {
            match component {
                Component::Normal(_) => has_normal = true,
                Component::CurDir => {}
                _ => {
                    return Err(EngineError::invalid_config(
                        "dst_dir_in_snapshot",
                        format!(
                            "'{}' must be a relative path inside the snapshot",
                            self.destination.display()
                        ),
                    ))
                }
            }
        }
        if !has_normal {
            return Err(EngineError::invalid_config(
                "dst_dir_in_snapshot",
                format!("destination for '{}' is empty", self.source.display()),
            ));
        }

        Ok(())
    }
}

/// Identity and policy of one snapshot job. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotConfig {
    pub name: String,
    pub interval: String,
    pub snapshots_dir: PathBuf,
    /// Generations numbered at or above this value are pruned
    pub retention: u32,
    pub dirs: Vec<DirectoryMapping>,
    pub pre_snapshot_commands: Vec<String>,
    pub post_snapshot_commands: Vec<String>,
    pub always_run_post_snapshot_commands: bool,
    /// Opaque to the engine, consumed by the scheduler
    pub cron: Option<String>,
}

impl SnapshotConfig {
    pub fn new(
        name: impl Into<String>,
        interval: impl Into<String>,
        snapshots_dir: impl Into<PathBuf>,
        retention: u32,
    ) -> Self {
        Self {
            name: name.into(),
            interval: interval.into(),
            snapshots_dir: snapshots_dir.into(),
            retention,
            dirs: Vec::new(),
            pre_snapshot_commands: Vec::new(),
            post_snapshot_commands: Vec::new(),
            always_run_post_snapshot_commands: false,
            cron: None,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        naming::validate_token("snapshot_name", &self.name)?;
        naming::validate_token("interval", &self.interval)?;

        if !self.snapshots_dir.is_absolute() {
            return Err(EngineError::invalid_config(
                "snapshots_dir",
                format!("'{}' is not an absolute path", self.snapshots_dir.display()),
            ));
        }

        for mapping in &self.dirs {
            mapping.validate()?;
        }

        // Mirror with delete into nested destinations would fight over the same files
        for (i, a) in self.dirs.iter().enumerate() {
            for b in self.dirs.iter().skip(i + 1) {
                if a.destination.starts_with(&b.destination)
                    || b.destination.starts_with(&a.destination)
                {
                    return Err(EngineError::invalid_config(
                        "dst_dir_in_snapshot",
                        format!(
                            "destinations '{}' and '{}' overlap",
                            a.destination.display(),
                            b.destination.display()
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn generation_path(&self, number: u32) -> PathBuf {
        self.snapshots_dir
            .join(naming::dir_name(&self.name, &self.interval, number))
    }

    pub fn newest_generation_path(&self) -> PathBuf {
        self.generation_path(0)
    }
}

// === GENERATIONS ===

/// A materialized generation on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotInstance {
    pub path: PathBuf,
    pub name: String,
    pub interval: String,
    pub number: u32,
}

impl SnapshotInstance {
    pub fn from_path(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let path = path.into();
        let dir_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| EngineError::InvalidGenerationName {
                name: path.display().to_string(),
                reason: "path has no UTF-8 file name".to_string(),
            })?;
        let generation = naming::parse(dir_name)?;

        Ok(Self {
            path,
            name: generation.name,
            interval: generation.interval,
            number: generation.number,
        })
    }

    pub fn generation_name(&self) -> GenerationName {
        GenerationName::new(self.name.clone(), self.interval.clone(), self.number)
    }

    /// Sum of file sizes under the tree, directories excluded. Computed on
    /// every call with a full walk.
    pub async fn size(&self) -> EngineResult<u64> {
        filesystem::tree_size(&self.path).await
    }

    pub async fn modified_at(&self) -> EngineResult<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| EngineError::io(&self.path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| EngineError::io(&self.path, e))?;
        Ok(DateTime::<Utc>::from(modified))
    }
}

/// Listing record for one generation
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    #[serde(flatten)]
    pub instance: SnapshotInstance,
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_error: Option<String>,
}
