// File: engine/src/services/commands.rs
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::errors::{EngineError, EngineResult};

/// Captured output of a finished external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}

/// Program and arguments joined for log and error messages
pub fn describe(command: &AsyncCommand) -> String {
    let std_command = command.as_std();
    std::iter::once(std_command.get_program())
        .chain(std_command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run to completion; any non-zero exit status is an error carrying the
/// command's diagnostic text (stderr, or stdout when stderr is empty).
pub async fn run(command: &mut AsyncCommand) -> EngineResult<ToolOutput> {
    let description = describe(command);
    debug!("Executing command: {}", description);

    let output = command
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| EngineError::Spawn {
            command: description.clone(),
            source: e,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if output.status.success() {
        Ok(ToolOutput { stdout, stderr })
    } else {
        let error_msg = if !stderr.trim().is_empty() { stderr } else { stdout };
        Err(EngineError::CommandFailed {
            command: description,
            exit_code: output.status.code(),
            output: error_msg.trim().to_string(),
        })
    }
}

pub async fn execute_shell_command(command: &str) -> EngineResult<ToolOutput> {
    let mut shell = AsyncCommand::new("sh");
    shell.arg("-c").arg(command);
    run(&mut shell).await
}
