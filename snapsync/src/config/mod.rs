// File: snapsync/src/config/mod.rs
pub mod manager;

use engine::{DirectoryMapping, EngineError, SnapshotConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::constants::defaults;
pub use manager::ConfigManager;

/// Global settings from `main.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log_level: Option<String>,
    #[serde(default = "default_cp_path")]
    pub cp_path: String,
    #[serde(default = "default_rsync_path")]
    pub rsync_path: String,
    // Populated from the individual job files
    #[serde(skip)]
    pub snapshots: Vec<SnapshotConfig>,
}

fn default_cp_path() -> String {
    defaults::CP_PATH.to_string()
}

fn default_rsync_path() -> String {
    defaults::RSYNC_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            cp_path: default_cp_path(),
            rsync_path: default_rsync_path(),
            snapshots: Vec::new(),
        }
    }
}

impl Config {
    pub fn find_snapshot(&self, name: &str) -> Option<&SnapshotConfig> {
        self.snapshots.iter().find(|snapshot| snapshot.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDirFile {
    pub src_dir_abspath: PathBuf,
    pub dst_dir_in_snapshot: Option<PathBuf>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// One job file (every `*.toml` other than `main.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfigFile {
    pub snapshot_name: String,
    pub interval: String,
    pub snapshots_dir: PathBuf,
    pub retention: u32,
    pub cron: Option<String>,
    #[serde(default)]
    pub always_run_post_snapshot_commands: bool,
    #[serde(default)]
    pub pre_snapshot_commands: Vec<String>,
    #[serde(default)]
    pub post_snapshot_commands: Vec<String>,
    #[serde(default)]
    pub dirs: Vec<SnapshotDirFile>,
}

impl SnapshotConfigFile {
    /// Convert to the engine's job definition, filling default destinations,
    /// and validate it.
    pub fn into_snapshot_config(self) -> Result<SnapshotConfig, EngineError> {
        let dirs = self
            .dirs
            .into_iter()
            .map(|dir| {
                let destination = dir
                    .dst_dir_in_snapshot
                    .unwrap_or_else(|| DirectoryMapping::default_destination(&dir.src_dir_abspath));
                DirectoryMapping::new(dir.src_dir_abspath, destination).with_excludes(dir.excludes)
            })
            .collect();

        let config = SnapshotConfig {
            name: self.snapshot_name,
            interval: self.interval,
            snapshots_dir: self.snapshots_dir,
            retention: self.retention,
            dirs,
            pre_snapshot_commands: self.pre_snapshot_commands,
            post_snapshot_commands: self.post_snapshot_commands,
            always_run_post_snapshot_commands: self.always_run_post_snapshot_commands,
            cron: self.cron.filter(|cron| !cron.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to expand environment variables in {path}: {reason}")]
    Expand { path: PathBuf, reason: String },

    #[error("Invalid snapshot config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("Duplicate snapshot_name '{name}' in {path} (already defined in {first})")]
    Duplicate {
        name: String,
        path: PathBuf,
        first: PathBuf,
    },

    #[error("Unknown snapshot '{0}'")]
    UnknownSnapshot(String),
}
