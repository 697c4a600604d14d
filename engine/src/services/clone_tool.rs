// File: engine/src/services/clone_tool.rs
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command as AsyncCommand;

use super::commands::{self, ToolOutput};
use crate::errors::EngineResult;

/// Copy a whole tree into an existing directory, sharing file content with
/// the original through hardlinks.
#[async_trait]
pub trait CloneTool: Send + Sync {
    async fn clone_tree(&self, from: &Path, to: &Path) -> EngineResult<ToolOutput>;
}

/// Hardlink clone backed by `cp -al`
#[derive(Debug, Clone)]
pub struct CpHardlinkClone {
    program: String,
}

impl Default for CpHardlinkClone {
    fn default() -> Self {
        Self::new("cp")
    }
}

impl CpHardlinkClone {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `cp -al FROM/. TO` copies the contents of FROM into TO
    pub fn command(&self, from: &Path, to: &Path) -> AsyncCommand {
        let mut source: OsString = from.as_os_str().to_owned();
        source.push("/.");

        let mut command = AsyncCommand::new(&self.program);
        command.arg("-al").arg(source).arg(to);
        command
    }
}

#[async_trait]
impl CloneTool for CpHardlinkClone {
    async fn clone_tree(&self, from: &Path, to: &Path) -> EngineResult<ToolOutput> {
        let mut command = self.command(from, to);
        commands::run(&mut command).await
    }
}
