// File: snapsync/src/scheduler/snapshots.rs
use super::cron::normalize_schedule;
use crate::config::Config;
use crate::constants::operations;
use crate::operation_tracker::OperationTracker;
use anyhow::{anyhow, Result};
use engine::{RunReport, SnapshotConfig, SnapshotExecutor};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, instrument, warn};

/// Run one job under the tracker. Returns `Ok(None)` when the job was
/// already running and this trigger was skipped.
pub async fn execute_tracked(
    executor: &SnapshotExecutor,
    tracker: &OperationTracker,
    snapshot: &SnapshotConfig,
    operation_type: &str,
) -> Result<Option<RunReport>> {
    let run_id = match tracker
        .try_start_operation(&snapshot.name, operation_type)
        .await
    {
        Ok(run_id) => run_id,
        Err(e) => {
            warn!("Skipping {} for {}: {}", operation_type, snapshot.name, e);
            return Ok(None);
        }
    };

    info!("🔧 Executing snapshot for {} (run {})", snapshot.name, run_id);
    let result = executor.run(snapshot).await;
    tracker.finish_operation(&snapshot.name, run_id).await;

    match result {
        Ok(report) => {
            info!(
                "✓ Snapshot completed for {}: {} ({} generations pruned)",
                snapshot.name,
                report.newest_generation.display(),
                report.pruned.len()
            );
            Ok(Some(report))
        }
        Err(e) => {
            error!("✗ Snapshot failed for {} (run {}): {}", snapshot.name, run_id, e);
            Err(e.into())
        }
    }
}

pub struct SnapshotScheduler {
    config: Arc<Config>,
    executor: Arc<SnapshotExecutor>,
    operation_tracker: Arc<OperationTracker>,
    scheduler: JobScheduler,
}

impl SnapshotScheduler {
    pub async fn new(
        config: Arc<Config>,
        executor: Arc<SnapshotExecutor>,
        operation_tracker: Arc<OperationTracker>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            config,
            executor,
            operation_tracker,
            scheduler,
        })
    }

    /// Register every job that has a cron expression and start the
    /// scheduler if at least one was registered. Returns that count.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<usize> {
        let mut scheduled_count = 0;

        for snapshot in &self.config.snapshots {
            let Some(schedule) = &snapshot.cron else {
                info!("No cron schedule configured for {}", snapshot.name);
                continue;
            };

            match self.schedule_snapshot_job(snapshot.clone(), schedule).await {
                Ok(normalized) => {
                    scheduled_count += 1;
                    info!("✓ Scheduled snapshot for {}: {}", snapshot.name, normalized);
                }
                Err(e) => {
                    error!(
                        "✗ Failed to schedule snapshot for {}: {} (schedule: {})",
                        snapshot.name, e, schedule
                    );
                }
            }
        }

        if scheduled_count > 0 {
            self.scheduler
                .start()
                .await
                .map_err(|e| anyhow!("Failed to start scheduler: {}", e))?;
            info!("✓ Snapshot scheduler started with {} jobs", scheduled_count);
        } else {
            warn!("No scheduled jobs configured - scheduler not started");
        }

        Ok(scheduled_count)
    }

    /// Run, in configuration order, every job that has no cron expression.
    /// Returns how many of them succeeded.
    pub async fn run_unscheduled(&self) -> usize {
        let mut succeeded = 0;

        for snapshot in self.config.snapshots.iter().filter(|s| s.cron.is_none()) {
            // Failures are logged inside with the run id
            let result = execute_tracked(
                &self.executor,
                &self.operation_tracker,
                snapshot,
                operations::STARTUP_SNAPSHOT,
            )
            .await;
            if let Ok(Some(_)) = result {
                succeeded += 1;
            }
        }

        succeeded
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to shut down scheduler: {}", e))?;
        info!("Snapshot scheduler stopped");
        Ok(())
    }

    async fn schedule_snapshot_job(
        &self,
        snapshot: SnapshotConfig,
        schedule: &str,
    ) -> Result<String> {
        let normalized = normalize_schedule(schedule)
            .map_err(|e| anyhow!("Invalid cron schedule '{}': {}", schedule, e))?;

        let executor = self.executor.clone();
        let operation_tracker = self.operation_tracker.clone();
        let snapshot = Arc::new(snapshot);

        let job = Job::new_async(normalized.as_str(), move |_uuid, _scheduler| {
            let executor = executor.clone();
            let operation_tracker = operation_tracker.clone();
            let snapshot = snapshot.clone();

            Box::pin(async move {
                // Logged inside
                let _ = execute_tracked(
                    &executor,
                    &operation_tracker,
                    &snapshot,
                    operations::SCHEDULED_SNAPSHOT,
                )
                .await;
            })
        })
        .map_err(|e| anyhow!("Failed to create snapshot job for '{}': {}", normalized, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add snapshot job to scheduler: {}", e))?;

        Ok(normalized)
    }
}
