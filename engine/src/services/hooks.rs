// File: engine/src/services/hooks.rs
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{error, info};

use super::commands;
use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Pre,
    Post,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::Pre => write!(f, "pre"),
            HookStage::Post => write!(f, "post"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub executed: usize,
    pub elapsed: Duration,
}

/// Runs a job's pre/post snapshot commands through `sh -c`, in order,
/// stopping at the first one that fails.
#[derive(Debug, Clone)]
pub struct HookRunner {
    snapshot_name: String,
}

impl HookRunner {
    pub fn new(snapshot_name: impl Into<String>) -> Self {
        Self {
            snapshot_name: snapshot_name.into(),
        }
    }

    pub async fn run_all(&self, stage: HookStage, hook_commands: &[String]) -> EngineResult<HookReport> {
        let started = Instant::now();

        if hook_commands.is_empty() {
            info!("[{}] No {} snapshot commands to run", self.snapshot_name, stage);
            return Ok(HookReport {
                executed: 0,
                elapsed: started.elapsed(),
            });
        }

        info!("[{}] Executing {} snapshot commands", self.snapshot_name, stage);

        for (executed, command) in hook_commands.iter().enumerate() {
            info!("[{}] {}", self.snapshot_name, command);

            match commands::execute_shell_command(command).await {
                Ok(output) => {
                    let text = output.stdout.trim();
                    if !text.is_empty() {
                        info!("[{}] {}: {}", self.snapshot_name, command, text);
                    }
                }
                Err(e) => {
                    error!("[{}] {}: {}", self.snapshot_name, command, e);
                    return Err(EngineError::HookFailed {
                        stage: stage.to_string(),
                        command: command.clone(),
                        reason: format!("{} (after {} successful commands)", e, executed),
                    });
                }
            }
        }

        let elapsed = started.elapsed();
        info!(
            "[{}] {} snapshot commands done in {:.3}s",
            self.snapshot_name,
            stage,
            elapsed.as_secs_f64()
        );

        Ok(HookReport {
            executed: hook_commands.len(),
            elapsed,
        })
    }
}
