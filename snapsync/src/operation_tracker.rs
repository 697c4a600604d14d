//! Run tracking for snapshot jobs
//!
//! Keeps one entry per job that is currently running so a cron firing that
//! arrives while the previous run of the same job is still going can be
//! skipped instead of racing it on the same snapshots directory.
//!
//! # Key Features
//!
//! - **One run per job**: a second start for a busy job fails
//! - **Distinct jobs run freely**: entries are keyed by snapshot name
//! - **Owned entries**: only the run that registered an entry releases it
//!
//! # Usage
//!
//! ```ignore
//! let run_id = tracker.try_start_operation("home", "scheduled_snapshot").await?;
//!
//! // Run the snapshot...
//!
//! tracker.finish_operation("home", run_id).await;
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ActiveOperation {
    pub run_id: Uuid,
    pub operation_type: String,
    pub snapshot_name: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationStatus {
    pub busy_snapshots: HashMap<String, ActiveOperation>,
    pub total_active: usize,
}

#[derive(Clone, Default)]
pub struct OperationTracker {
    active_operations: Arc<RwLock<HashMap<String, ActiveOperation>>>, // snapshot_name -> run
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a run of `snapshot_name`, returning its run id.
    /// Fails if that job is already running.
    #[instrument(skip(self), fields(snapshot = %snapshot_name, operation = %operation_type))]
    pub async fn try_start_operation(
        &self,
        snapshot_name: &str,
        operation_type: &str,
    ) -> Result<Uuid> {
        let mut active = self.active_operations.write().await;

        if let Some(current_op) = active.get(snapshot_name) {
            let duration = Utc::now().signed_duration_since(current_op.started_at);
            let duration_str = if duration.num_hours() > 0 {
                format!("{}h {}m", duration.num_hours(), duration.num_minutes() % 60)
            } else {
                format!("{}m", duration.num_minutes())
            };

            return Err(anyhow::anyhow!(
                "Snapshot {} is busy with '{}' run {} (started {} ago)",
                snapshot_name,
                current_op.operation_type,
                current_op.run_id,
                duration_str
            ));
        }

        let operation = ActiveOperation {
            run_id: Uuid::new_v4(),
            operation_type: operation_type.to_string(),
            snapshot_name: snapshot_name.to_string(),
            started_at: Utc::now(),
        };
        let run_id = operation.run_id;

        active.insert(snapshot_name.to_string(), operation);
        info!(
            "Started '{}' on {} (run {})",
            operation_type, snapshot_name, run_id
        );
        Ok(run_id)
    }

    /// Release the entry of `run_id`. An entry held by another run is left alone.
    #[instrument(skip(self), fields(snapshot = %snapshot_name, run = %run_id))]
    pub async fn finish_operation(&self, snapshot_name: &str, run_id: Uuid) {
        let mut active = self.active_operations.write().await;
        let owner = active.get(snapshot_name).map(|op| op.run_id);
        match owner {
            Some(owner) if owner == run_id => {
                if let Some(op) = active.remove(snapshot_name) {
                    let duration = Utc::now().signed_duration_since(op.started_at);
                    info!(
                        "Finished '{}' on {} (run {}, took {}s)",
                        op.operation_type,
                        snapshot_name,
                        run_id,
                        duration.num_seconds()
                    );
                }
            }
            Some(owner) => {
                warn!(
                    "Run {} on {} finished but the entry belongs to run {}",
                    run_id, snapshot_name, owner
                );
            }
            None => {}
        }
    }

    pub async fn get_operation_status(&self) -> OperationStatus {
        let active = self.active_operations.read().await;
        OperationStatus {
            busy_snapshots: active.clone(),
            total_active: active.len(),
        }
    }

    pub async fn is_busy(&self, snapshot_name: &str) -> bool {
        let active = self.active_operations.read().await;
        active.contains_key(snapshot_name)
    }
}
