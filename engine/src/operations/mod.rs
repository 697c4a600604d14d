pub mod pruning;
pub mod restore;
pub mod rotation;
pub mod snapshots;

pub use pruning::{PruneOutcome, RetentionPruner};
pub use restore::RestoreExecutor;
pub use rotation::{Rename, RotationManager};
pub use snapshots::{RunReport, SnapshotExecutor};
