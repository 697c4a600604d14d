//! Application-wide names and defaults

/// Directory name under the user config dir, and the binary name
pub const APP_NAME: &str = "snapsync";

/// Global settings file inside the configs directory
pub const MAIN_CONFIG_FILE: &str = "main.toml";

/// Values used when `main.toml` leaves a key out
pub mod defaults {
    pub const CP_PATH: &str = "cp";
    pub const RSYNC_PATH: &str = "rsync";
    pub const LOG_LEVEL: &str = "info";
}

/// Operation types recorded in the tracker
pub mod operations {
    pub const SCHEDULED_SNAPSHOT: &str = "scheduled_snapshot";
    pub const STARTUP_SNAPSHOT: &str = "startup_snapshot";
}
