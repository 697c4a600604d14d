//! Cron-based triggering of snapshot jobs
//!
//! Every job with a `cron` expression is registered with
//! tokio-cron-scheduler; jobs without one run once when the daemon starts.
//!
//! # Features
//!
//! - **Classic cron syntax**: 5-field expressions are accepted and get a
//!   `0` seconds field; 6-field expressions are used as they are
//! - **Skip if running**: a firing is dropped while the previous run of the
//!   same job is still in progress
//! - **Per-job failures**: an invalid expression only keeps that job from
//!   being scheduled
//!
//! # Configuration
//!
//! Schedules are defined per job in `<configs_dir>/<job>.toml`:
//!
//! ```toml
//! snapshot_name = "home"
//! interval = "hourly"
//! cron = "0 * * * *"  # Every hour on the hour
//! ```

pub mod cron;
pub mod snapshots;

pub use snapshots::{execute_tracked, SnapshotScheduler};
