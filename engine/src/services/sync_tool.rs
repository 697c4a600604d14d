// File: engine/src/services/sync_tool.rs
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use super::commands::{self, ToolOutput};
use crate::errors::EngineResult;

/// One-way mirror of a directory tree, deleting destination entries that
/// are absent from the source.
#[async_trait]
pub trait SyncTool: Send + Sync {
    async fn mirror(&self, from: &Path, to: &Path, excludes: &[String]) -> EngineResult<ToolOutput>;
}

/// Mirror sync backed by the `rsync` binary
#[derive(Debug, Clone)]
pub struct RsyncMirror {
    program: String,
}

impl Default for RsyncMirror {
    fn default() -> Self {
        Self::new("rsync")
    }
}

impl RsyncMirror {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `rsync -ahLK --delete --stats [--exclude=PATTERN]... FROM/ TO`
    ///
    /// The trailing slash on the source copies its contents rather than the
    /// directory itself. `--stats` keeps the output to the transfer summary.
    pub fn command(&self, from: &Path, to: &Path, excludes: &[String]) -> AsyncCommand {
        let mut command = AsyncCommand::new(&self.program);
        command.args(["-ahLK", "--delete", "--stats"]);
        for exclude in excludes {
            command.arg(format!("--exclude={exclude}"));
        }

        let mut source: OsString = from.as_os_str().to_owned();
        source.push("/");
        command.arg(source).arg(to);
        command
    }
}

#[async_trait]
impl SyncTool for RsyncMirror {
    async fn mirror(&self, from: &Path, to: &Path, excludes: &[String]) -> EngineResult<ToolOutput> {
        let mut command = self.command(from, to, excludes);
        let output = commands::run(&mut command).await?;
        if !output.stdout.trim().is_empty() {
            debug!("rsync {} -> {}:\n{}", from.display(), to.display(), output.stdout.trim());
        }
        Ok(output)
    }
}
