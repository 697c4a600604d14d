//! Read-only view of the generations on disk
//!
//! The scan here is shared by rotation and pruning, so every component agrees
//! on what counts as a generation: an entry of the snapshots root whose name
//! parses as `<name>.<interval>.<number>`. Scratch directories and foreign
//! entries are ignored.

use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{EngineError, EngineResult};
use crate::naming::{self, SCRATCH_PREFIX};
use crate::types::{SnapshotConfig, SnapshotInstance, SnapshotSummary};

/// Enumerate generations of `name` under `root`, optionally limited to one
/// interval. Sorted ascending by generation number, then by interval label.
/// A missing root yields an empty list.
pub async fn scan_generations(
    root: &Path,
    name: &str,
    interval: Option<&str>,
) -> EngineResult<Vec<SnapshotInstance>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Snapshots directory {} does not exist yet", root.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(EngineError::io(root, e)),
    };

    let name_prefix = format!("{}{}", name, naming::SEPARATOR);
    let mut generations = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| EngineError::io(root, e))?
    {
        let file_name = entry.file_name();
        let Some(dir_name) = file_name.to_str() else {
            continue;
        };
        if !dir_name.starts_with(&name_prefix) {
            continue;
        }

        match naming::parse(dir_name) {
            Ok(generation) => {
                let wanted = match interval {
                    Some(interval) => generation.belongs_to(name, interval),
                    None => generation.name == name,
                };
                if !wanted {
                    continue;
                }
                generations.push(SnapshotInstance {
                    path: entry.path(),
                    name: generation.name,
                    interval: generation.interval,
                    number: generation.number,
                });
            }
            Err(e) => {
                warn!("Ignoring {} in {}: {}", dir_name, root.display(), e);
            }
        }
    }

    generations.sort_by(|a, b| {
        a.number
            .cmp(&b.number)
            .then_with(|| a.interval.cmp(&b.interval))
    });
    Ok(generations)
}

/// Scratch directories left behind by runs that never finished
pub async fn scan_scratch_dirs(root: &Path) -> EngineResult<Vec<std::path::PathBuf>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(EngineError::io(root, e)),
    };

    let mut leftovers = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| EngineError::io(root, e))?
    {
        // Generations of a job whose name starts with the prefix are not residue
        let is_scratch = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with(SCRATCH_PREFIX) && naming::parse(n).is_err());
        if is_scratch {
            leftovers.push(entry.path());
        }
    }
    leftovers.sort();
    Ok(leftovers)
}

pub struct SnapshotCatalog;

impl SnapshotCatalog {
    /// All generations of the job, every interval label included, ordered
    /// by ascending generation number (newest first).
    pub async fn list(config: &SnapshotConfig) -> EngineResult<Vec<SnapshotInstance>> {
        scan_generations(&config.snapshots_dir, &config.name, None).await
    }

    /// Listing with modification time and size. A size that cannot be
    /// computed is reported on that entry only.
    pub async fn describe(config: &SnapshotConfig) -> EngineResult<Vec<SnapshotSummary>> {
        let instances = Self::list(config).await?;
        let mut summaries = Vec::with_capacity(instances.len());

        for instance in instances {
            let modified_at = match instance.modified_at().await {
                Ok(modified) => Some(modified),
                Err(e) => {
                    warn!("Can't stat {}: {}", instance.path.display(), e);
                    None
                }
            };
            let (size_bytes, size_error) = match instance.size().await {
                Ok(size) => (Some(size), None),
                Err(e) => (None, Some(e.to_string())),
            };
            summaries.push(SnapshotSummary {
                instance,
                modified_at,
                size_bytes,
                size_error,
            });
        }

        Ok(summaries)
    }

    pub async fn find(
        config: &SnapshotConfig,
        interval: &str,
        number: u32,
    ) -> EngineResult<SnapshotInstance> {
        scan_generations(&config.snapshots_dir, &config.name, Some(interval))
            .await?
            .into_iter()
            .find(|instance| instance.number == number)
            .ok_or_else(|| EngineError::GenerationNotFound {
                name: config.name.clone(),
                interval: interval.to_string(),
                number,
            })
    }
}
