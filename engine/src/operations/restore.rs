// File: engine/src/operations/restore.rs
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::errors::{EngineError, EngineResult};
use crate::services::{filesystem, RsyncMirror, SyncTool};
use crate::types::{SnapshotConfig, SnapshotInstance};

/// Mirrors a generation's mapped subdirectories back onto their sources.
///
/// Destructive: files in a source directory that are absent from the
/// generation are deleted. Best-effort across mappings.
pub struct RestoreExecutor {
    sync_tool: Arc<dyn SyncTool>,
}

impl RestoreExecutor {
    pub fn new(sync_tool: Arc<dyn SyncTool>) -> Self {
        Self { sync_tool }
    }

    pub fn with_system_tools(rsync_path: impl Into<String>) -> Self {
        Self::new(Arc::new(RsyncMirror::new(rsync_path)))
    }

    /// Returns the number of mappings restored. When some fail, the first
    /// error is returned after every mapping has been attempted.
    #[instrument(skip_all, fields(snapshot = %config.name, generation = %instance.number))]
    pub async fn restore(
        &self,
        config: &SnapshotConfig,
        instance: &SnapshotInstance,
    ) -> EngineResult<usize> {
        if instance.name != config.name {
            return Err(EngineError::invalid_config(
                "snapshot_name",
                format!(
                    "generation {} does not belong to job '{}'",
                    instance.path.display(),
                    config.name
                ),
            ));
        }
        if !filesystem::exists(&instance.path).await? {
            return Err(EngineError::GenerationNotFound {
                name: instance.name.clone(),
                interval: instance.interval.clone(),
                number: instance.number,
            });
        }

        info!(
            "[{}] Restoring from {}",
            config.name,
            instance.path.display()
        );

        let mut restored = 0;
        let mut first_error = None;

        for mapping in &config.dirs {
            let from = instance.path.join(&mapping.destination);
            match filesystem::exists(&from).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        "[{}] {} is not in {}, skipping {}",
                        config.name,
                        mapping.destination.display(),
                        instance.path.display(),
                        mapping.source.display()
                    );
                    continue;
                }
                Err(e) => {
                    error!("[{}] {}", config.name, e);
                    first_error.get_or_insert(e);
                    continue;
                }
            }

            match self.restore_mapping(&from, &mapping.source).await {
                Ok(()) => {
                    restored += 1;
                    info!(
                        "[{}] ✓ Restored {} to {}",
                        config.name,
                        from.display(),
                        mapping.source.display()
                    );
                }
                Err(e) => {
                    error!(
                        "[{}] Can't restore {} to {}: {}",
                        config.name,
                        from.display(),
                        mapping.source.display(),
                        e
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(restored),
        }
    }

    async fn restore_mapping(&self, from: &Path, to: &Path) -> EngineResult<()> {
        filesystem::create_directory(to).await?;
        self.sync_tool.mirror(from, to, &[]).await?;
        Ok(())
    }
}
