pub mod config;
pub mod constants;
pub mod listing;
pub mod operation_tracker;
pub mod scheduler;

// Re-export commonly used types
pub use config::{Config, ConfigError, ConfigManager};
pub use operation_tracker::OperationTracker;
pub use scheduler::SnapshotScheduler;
