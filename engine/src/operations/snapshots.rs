// File: engine/src/operations/snapshots.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::pruning::{PruneOutcome, RetentionPruner};
use super::rotation::RotationManager;
use crate::catalog;
use crate::errors::{EngineError, EngineResult};
use crate::naming::SCRATCH_PREFIX;
use crate::services::{
    filesystem, CloneTool, CpHardlinkClone, HookRunner, HookStage, RsyncMirror, SyncTool,
};
use crate::types::SnapshotConfig;

/// What one successful run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub snapshot_name: String,
    pub newest_generation: PathBuf,
    pub pruned: Vec<PruneOutcome>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Drives one job through hooks, build, rotation and pruning
pub struct SnapshotExecutor {
    sync_tool: Arc<dyn SyncTool>,
    clone_tool: Arc<dyn CloneTool>,
}

impl SnapshotExecutor {
    pub fn new(sync_tool: Arc<dyn SyncTool>, clone_tool: Arc<dyn CloneTool>) -> Self {
        Self {
            sync_tool,
            clone_tool,
        }
    }

    pub fn with_system_tools(cp_path: impl Into<String>, rsync_path: impl Into<String>) -> Self {
        Self::new(
            Arc::new(RsyncMirror::new(rsync_path)),
            Arc::new(CpHardlinkClone::new(cp_path)),
        )
    }

    #[instrument(skip_all, fields(snapshot = %config.name, interval = %config.interval))]
    pub async fn run(&self, config: &SnapshotConfig) -> EngineResult<RunReport> {
        let started_at = Utc::now();
        let started = Instant::now();

        // Step 1: Reject bad configuration before touching anything
        config.validate()?;
        if config.retention == 0 {
            warn!(
                "[{}] Retention is 0, every generation including the new one will be pruned",
                config.name
            );
        }

        // Step 2: Pre hooks; a failure aborts the run before any build work
        let hooks = HookRunner::new(&config.name);
        hooks
            .run_all(HookStage::Pre, &config.pre_snapshot_commands)
            .await?;

        // Step 3: Build, rotate, prune
        let outcome = match self.snapshot(config).await {
            Ok(done) => Ok(done),
            Err(e) => {
                error!("[{}] Snapshot failed: {}", config.name, e);
                if !config.always_run_post_snapshot_commands {
                    info!(
                        "[{}] Skipping post snapshot commands after failed snapshot",
                        config.name
                    );
                    return Err(e);
                }
                Err(e)
            }
        };

        // Step 4: Post hooks
        let post = hooks
            .run_all(HookStage::Post, &config.post_snapshot_commands)
            .await;

        let (newest_generation, pruned) = match (outcome, post) {
            (Err(build_error), Err(hook_error)) => {
                warn!(
                    "[{}] Post snapshot commands also failed: {}",
                    config.name, hook_error
                );
                return Err(build_error);
            }
            (Err(build_error), Ok(_)) => return Err(build_error),
            (Ok(_), Err(hook_error)) => return Err(hook_error),
            (Ok(done), Ok(_)) => done,
        };

        // Step 5: Stamp the completion time on the newest generation
        if filesystem::exists(&newest_generation).await.unwrap_or(false) {
            if let Err(e) = filesystem::touch(&newest_generation).await {
                warn!(
                    "[{}] Can't update timestamp of {}: {}",
                    config.name,
                    newest_generation.display(),
                    e
                );
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "[{}] ✓ Snapshot run completed in {:.3}s",
            config.name,
            duration_ms as f64 / 1000.0
        );

        Ok(RunReport {
            snapshot_name: config.name.clone(),
            newest_generation,
            pruned,
            started_at,
            duration_ms,
        })
    }

    /// Build a new generation, rotate it in and prune. No hooks.
    pub async fn snapshot(
        &self,
        config: &SnapshotConfig,
    ) -> EngineResult<(PathBuf, Vec<PruneOutcome>)> {
        let started = Instant::now();
        let root = &config.snapshots_dir;

        filesystem::create_directory(root).await?;

        for leftover in catalog::scan_scratch_dirs(root).await? {
            warn!(
                "[{}] Found scratch directory {} not owned by this run; it holds no generation and can be removed once no other job is running",
                config.name,
                leftover.display()
            );
        }

        // Removed on drop unless the build is installed
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(root)
            .map_err(|e| EngineError::io(root, e))?;
        debug!("[{}] Building in {}", config.name, scratch.path().display());

        self.build(config, scratch.path()).await?;

        let newest = RotationManager::for_config(config)
            .rotate_in(scratch.path())
            .await?;
        // Already renamed away; stop the guard from deleting anything
        let _ = scratch.keep();

        let pruned = match RetentionPruner::for_config(config)
            .prune(config.retention)
            .await
        {
            Ok(outcomes) => outcomes,
            Err(e) => {
                error!("[{}] Can't enumerate generations to prune: {}", config.name, e);
                Vec::new()
            }
        };

        info!(
            "[{}] Snapshot built in {:.3}s",
            config.name,
            started.elapsed().as_secs_f64()
        );
        Ok((newest, pruned))
    }

    async fn build(&self, config: &SnapshotConfig, scratch: &Path) -> EngineResult<()> {
        let newest = config.newest_generation_path();

        if filesystem::exists(&newest).await? {
            debug!(
                "[{}] Cloning {} into {}",
                config.name,
                newest.display(),
                scratch.display()
            );
            self.clone_tool.clone_tree(&newest, scratch).await?;
        } else {
            info!("[{}] Creating first snapshot {}", config.name, newest.display());
        }

        if let Err(e) = filesystem::touch(scratch).await {
            warn!(
                "[{}] Can't update timestamp of {}: {}",
                config.name,
                scratch.display(),
                e
            );
        }

        for mapping in &config.dirs {
            if !filesystem::exists(&mapping.source).await? {
                warn!(
                    "[{}] Source directory {} does not exist, skipping",
                    config.name,
                    mapping.source.display()
                );
                continue;
            }

            let destination = scratch.join(&mapping.destination);
            filesystem::create_directory(&destination).await?;

            info!(
                "[{}] Syncing {} to {}",
                config.name,
                mapping.source.display(),
                mapping.destination.display()
            );
            self.sync_tool
                .mirror(&mapping.source, &destination, &mapping.excludes)
                .await
                .inspect_err(|e| {
                    error!(
                        "[{}] Can't sync {}: {}",
                        config.name,
                        mapping.source.display(),
                        e
                    )
                })?;
        }

        Ok(())
    }
}

impl Default for SnapshotExecutor {
    fn default() -> Self {
        Self::new(
            Arc::new(RsyncMirror::default()),
            Arc::new(CpHardlinkClone::default()),
        )
    }
}
