// File: snapsync/src/config/manager.rs
use super::{Config, ConfigError, SnapshotConfigFile};
use crate::constants::{APP_NAME, MAIN_CONFIG_FILE};
use anyhow::{anyhow, Result};
use engine::SnapshotConfig;
use glob::{glob, Pattern};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, warn};

pub struct ConfigManager {
    config_dir: PathBuf,
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: impl Into<PathBuf>, expand_vars: bool) -> Result<Self> {
        let config_dir = config_dir.into();
        let main_config = Self::load_main_config(&config_dir, expand_vars).await?;
        Self::with_main_config(config_dir, main_config, expand_vars).await
    }

    /// Finish loading when `main.toml` was already read (for logging setup)
    pub async fn with_main_config(
        config_dir: impl Into<PathBuf>,
        main_config: Config,
        expand_vars: bool,
    ) -> Result<Self> {
        let config_dir = config_dir.into();
        let config = Self::load_configuration(&config_dir, main_config, expand_vars).await?;
        Ok(Self {
            config_dir,
            current_config: Arc::new(config),
        })
    }

    /// `<user config dir>/snapsync`
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or_else(|| anyhow!("Can't determine the user config directory, use --configs-dir"))
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn find_snapshot(&self, name: &str) -> Result<SnapshotConfig, ConfigError> {
        self.current_config
            .find_snapshot(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownSnapshot(name.to_string()))
    }

    /// Read `main.toml`, creating the configs directory if needed. A missing
    /// file yields the defaults.
    pub async fn load_main_config(config_dir: &Path, expand_vars: bool) -> Result<Config> {
        fs::create_dir_all(config_dir)
            .await
            .map_err(|e| anyhow!("Failed to create configs dir {}: {}", config_dir.display(), e))?;

        let main_config_path = config_dir.join(MAIN_CONFIG_FILE);
        if !fs::try_exists(&main_config_path).await.unwrap_or(false) {
            debug!(
                "No {} found, using default settings",
                main_config_path.display()
            );
            return Ok(Config::default());
        }

        let config: Config = read_toml(&main_config_path, expand_vars).await?;
        Ok(config)
    }

    async fn load_configuration(
        config_dir: &Path,
        mut config: Config,
        expand_vars: bool,
    ) -> Result<Config> {
        let pattern = format!(
            "{}/*.toml",
            Pattern::escape(&config_dir.to_string_lossy())
        );
        let mut sources: HashMap<String, PathBuf> = HashMap::new();

        for entry in glob(&pattern).map_err(|e| anyhow!("Glob pattern error: {}", e))? {
            let path = entry.map_err(|e| anyhow!("Glob entry error: {}", e))?;

            // Skip main.toml as it's already loaded
            if path.file_name().and_then(|name| name.to_str()) == Some(MAIN_CONFIG_FILE) {
                continue;
            }

            debug!("Loading snapshot config: {}", path.display());

            match Self::load_snapshot_file(&path, expand_vars).await {
                Ok(snapshot) => {
                    if let Some(first) = sources.get(&snapshot.name) {
                        let err = ConfigError::Duplicate {
                            name: snapshot.name.clone(),
                            path: path.clone(),
                            first: first.clone(),
                        };
                        error!("✗ Skipping {}: {}", path.display(), err);
                        continue;
                    }
                    if snapshot.retention == 0 {
                        warn!(
                            "Snapshot {} has retention 0, every generation will be pruned after each run",
                            snapshot.name
                        );
                    }
                    sources.insert(snapshot.name.clone(), path.clone());
                    config.snapshots.push(snapshot);
                }
                Err(e) => {
                    error!("✗ Skipping {}: {}", path.display(), e);
                }
            }
        }

        info!(
            "Loaded {} snapshot configs from {}",
            config.snapshots.len(),
            config_dir.display()
        );

        Ok(config)
    }

    pub async fn load_snapshot_file(
        path: &Path,
        expand_vars: bool,
    ) -> Result<SnapshotConfig, ConfigError> {
        let file: SnapshotConfigFile = read_toml(path, expand_vars).await?;
        file.into_snapshot_config()
            .map_err(|source| ConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Expand `$VAR` and `${VAR}` from the process environment. An undefined
/// variable is an error.
pub fn expand_env(content: &str) -> Result<String, String> {
    shellexpand::env(content)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| e.to_string())
}

async fn read_toml<T: DeserializeOwned>(path: &Path, expand_vars: bool) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let content = if expand_vars {
        expand_env(&content).map_err(|reason| ConfigError::Expand {
            path: path.to_path_buf(),
            reason,
        })?
    } else {
        content
    };

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
