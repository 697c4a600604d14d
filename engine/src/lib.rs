//! Snapshot lifecycle engine
//!
//! Maintains numbered, retention-bounded generations of directory trees.
//! Generation 0 is always the newest; every run clones generation 0 with
//! hardlinks, mirrors the configured sources into the clone, shifts the
//! existing generations up by one and installs the clone as the new
//! generation 0.
//!
//! # Run Sequence
//!
//! 1. Pre snapshot hooks (any failure aborts the run)
//! 2. Incremental build in a scratch directory (hardlink clone + mirror sync)
//! 3. Rotation (N → N+1, highest first) and installation of generation 0
//! 4. Retention pruning
//! 5. Post snapshot hooks

pub mod catalog;
pub mod errors;
pub mod naming;
pub mod operations;
pub mod services;
pub mod types;

pub use catalog::SnapshotCatalog;
pub use errors::{EngineError, EngineResult};
pub use naming::GenerationName;
pub use operations::{
    PruneOutcome, RestoreExecutor, RetentionPruner, RotationManager, RunReport, SnapshotExecutor,
};
pub use services::{CloneTool, CpHardlinkClone, HookRunner, HookStage, RsyncMirror, SyncTool, ToolOutput};
pub use types::{DirectoryMapping, SnapshotConfig, SnapshotInstance, SnapshotSummary};
