// File: engine/src/operations/pruning.rs
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::catalog;
use crate::errors::EngineResult;
use crate::services::filesystem;
use crate::types::SnapshotConfig;

/// Result of removing one generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneOutcome {
    pub path: PathBuf,
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PruneOutcome {
    pub fn is_removed(&self) -> bool {
        self.error.is_none()
    }
}

/// Deletes every generation of one job numbered at or above the retention
/// count. Best-effort: a generation that cannot be removed is reported and
/// the rest are still attempted.
pub struct RetentionPruner<'a> {
    root: &'a Path,
    name: &'a str,
    interval: &'a str,
}

impl<'a> RetentionPruner<'a> {
    pub fn new(root: &'a Path, name: &'a str, interval: &'a str) -> Self {
        Self {
            root,
            name,
            interval,
        }
    }

    pub fn for_config(config: &'a SnapshotConfig) -> Self {
        Self::new(&config.snapshots_dir, &config.name, &config.interval)
    }

    pub async fn prune(&self, retention: u32) -> EngineResult<Vec<PruneOutcome>> {
        let expired: Vec<_> =
            catalog::scan_generations(self.root, self.name, Some(self.interval))
                .await?
                .into_iter()
                .filter(|generation| generation.number >= retention)
                .collect();

        if expired.is_empty() {
            debug!("[{}] Nothing to prune (retention {})", self.name, retention);
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::with_capacity(expired.len());
        for generation in expired {
            info!("[{}] Removing {}", self.name, generation.path.display());
            let error = match filesystem::remove_path(&generation.path).await {
                Ok(()) => None,
                Err(e) => {
                    error!(
                        "[{}] Can't remove {}: {}",
                        self.name,
                        generation.path.display(),
                        e
                    );
                    Some(e.to_string())
                }
            };
            outcomes.push(PruneOutcome {
                path: generation.path,
                number: generation.number,
                error,
            });
        }

        Ok(outcomes)
    }
}
