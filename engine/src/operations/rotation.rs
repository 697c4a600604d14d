// File: engine/src/operations/rotation.rs
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

use crate::catalog;
use crate::errors::{EngineError, EngineResult};
use crate::naming;
use crate::services::filesystem;
use crate::types::SnapshotConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Renumbers the generations of one job (k → k+1) and installs a finished
/// build as generation 0.
///
/// The shift is not transactional: the planned rename sequence is logged
/// before it starts, and a failure part way through reports how many renames
/// completed. Nothing is rolled back.
pub struct RotationManager<'a> {
    root: &'a Path,
    name: &'a str,
    interval: &'a str,
}

impl<'a> RotationManager<'a> {
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

    /// Renames needed to shift every generation up by one, highest number
    /// first so no rename targets a generation that has not moved yet.
    pub async fn plan(&self) -> EngineResult<Vec<Rename>> {
        let mut generations =
            catalog::scan_generations(self.root, self.name, Some(self.interval)).await?;
        generations.sort_by(|a, b| b.number.cmp(&a.number));

        generations
            .into_iter()
            .map(|generation| {
                let next = generation.generation_name().next().ok_or_else(|| {
                    EngineError::RotationFailed {
                        from: generation.path.clone(),
                        to: generation.path.clone(),
                        completed: 0,
                        reason: "generation number overflow".to_string(),
                    }
                })?;
                Ok(Rename {
                    to: self.root.join(next.to_string()),
                    from: generation.path,
                })
            })
            .collect()
    }

    /// Shift all existing generations; returns the number moved
    pub async fn shift(&self) -> EngineResult<usize> {
        let plan = self.plan().await?;
        if plan.is_empty() {
            debug!("[{}] No existing generations to shift", self.name);
            return Ok(0);
        }

        let steps: Vec<String> = plan
            .iter()
            .map(|r| format!("{} -> {}", file_name(&r.from), file_name(&r.to)))
            .collect();
        info!(
            "[{}] Rotating {} generations in {}: {}",
            self.name,
            plan.len(),
            self.root.display(),
            steps.join(", ")
        );

        for (completed, rename) in plan.iter().enumerate() {
            self.rename(rename, completed).await?;
        }

        Ok(plan.len())
    }

    /// Move a finished build into place as generation 0. `shifted` is the
    /// number of renames already done in this rotation.
    pub async fn install(&self, build_dir: &Path, shifted: usize) -> EngineResult<PathBuf> {
        let newest = self
            .root
            .join(naming::dir_name(self.name, self.interval, 0));
        let rename = Rename {
            from: build_dir.to_path_buf(),
            to: newest.clone(),
        };
        self.rename(&rename, shifted).await?;
        Ok(newest)
    }

    #[instrument(skip(self, build_dir), fields(snapshot = %self.name))]
    pub async fn rotate_in(&self, build_dir: &Path) -> EngineResult<PathBuf> {
        let shifted = self.shift().await?;
        let newest = self.install(build_dir, shifted).await?;
        info!(
            "[{}] ✓ Installed {} ({} older generations shifted)",
            self.name,
            newest.display(),
            shifted
        );
        Ok(newest)
    }

    async fn rename(&self, rename: &Rename, completed: usize) -> EngineResult<()> {
        let failed = |reason: String| {
            error!(
                "[{}] Can't move {} to {}: {}",
                self.name,
                rename.from.display(),
                rename.to.display(),
                reason
            );
            EngineError::RotationFailed {
                from: rename.from.clone(),
                to: rename.to.clone(),
                completed,
                reason,
            }
        };

        // A directory rename onto an empty directory silently replaces it
        if filesystem::exists(&rename.to).await? {
            return Err(failed("target already exists".to_string()));
        }

        tokio::fs::rename(&rename.from, &rename.to)
            .await
            .map_err(|e| failed(e.to_string()))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
