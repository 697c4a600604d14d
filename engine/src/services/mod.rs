pub mod clone_tool;
pub mod commands;
pub mod filesystem;
pub mod hooks;
pub mod sync_tool;

pub use clone_tool::{CloneTool, CpHardlinkClone};
pub use commands::ToolOutput;
pub use hooks::{HookReport, HookRunner, HookStage};
pub use sync_tool::{RsyncMirror, SyncTool};
