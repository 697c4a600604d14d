// File: snapsync/src/main.rs
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use engine::{RestoreExecutor, SnapshotCatalog, SnapshotExecutor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use snapsync::config::ConfigManager;
use snapsync::constants::defaults;
use snapsync::listing;
use snapsync::operation_tracker::OperationTracker;
use snapsync::scheduler::SnapshotScheduler;

#[derive(Parser, Debug)]
#[command(
    name = "snapsync",
    version,
    about = "Rotating hardlink snapshots of directory trees"
)]
struct Cli {
    /// Directory holding main.toml and one *.toml file per snapshot job
    #[arg(long, global = true)]
    configs_dir: Option<PathBuf>,

    /// Don't expand $VAR / ${VAR} in config files
    #[arg(long, global = true)]
    no_expand_vars: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run scheduled jobs until interrupted (default)
    Run,
    /// Take one snapshot now
    Snapshot { name: String },
    /// List the generations of a job
    List {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Mirror a generation back onto the job's source directories
    Restore {
        name: String,
        number: u32,
        /// Interval label of the generation (defaults to the job's interval)
        #[arg(long)]
        interval: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let expand_vars = !cli.no_expand_vars;

    let config_dir = match cli.configs_dir {
        Some(dir) => dir,
        None => ConfigManager::default_config_dir()?,
    };

    // main.toml decides the log level, so it is read before anything logs
    let main_config = ConfigManager::load_main_config(&config_dir, expand_vars).await?;
    init_tracing(main_config.log_level.as_deref())?;

    let config_manager =
        ConfigManager::with_main_config(&config_dir, main_config, expand_vars).await?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(&config_manager).await,
        Commands::Snapshot { name } => run_snapshot(&config_manager, &name).await,
        Commands::List { name, json } => list_generations(&config_manager, &name, json).await,
        Commands::Restore {
            name,
            number,
            interval,
        } => restore_generation(&config_manager, &name, number, interval).await,
    }
}

fn init_tracing(log_level: Option<&str>) -> Result<()> {
    let level = log_level.unwrap_or(defaults::LOG_LEVEL);

    // RUST_LOG wins over main.toml
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("snapsync={}", level).parse()?)
            .add_directive(format!("engine={}", level).parse()?),
    }
    .add_directive("tokio_cron_scheduler=warn".parse()?);

    fmt().with_env_filter(env_filter).init();
    Ok(())
}

async fn run_daemon(config_manager: &ConfigManager) -> Result<()> {
    let config = config_manager.get_current_config();
    info!(
        "Starting snapsync with {} snapshot jobs from {}",
        config.snapshots.len(),
        config_manager.config_dir().display()
    );

    let executor = Arc::new(SnapshotExecutor::with_system_tools(
        &config.cp_path,
        &config.rsync_path,
    ));
    let operation_tracker = Arc::new(OperationTracker::new());

    let mut scheduler =
        SnapshotScheduler::new(config.clone(), executor, operation_tracker.clone()).await?;
    let scheduled = scheduler.start().await?;

    let immediate = config.snapshots.iter().filter(|s| s.cron.is_none()).count();
    if immediate > 0 {
        let succeeded = scheduler.run_unscheduled().await;
        info!("Startup runs finished: {}/{} succeeded", succeeded, immediate);
    }

    if scheduled == 0 {
        info!("No cron schedules configured, exiting");
        return Ok(());
    }

    info!("Waiting for scheduled runs (Ctrl+C to stop)");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow!("Failed to listen for shutdown signal: {}", e))?;
    info!("Shutdown signal received");

    let status = operation_tracker.get_operation_status().await;
    if status.total_active > 0 {
        let running: Vec<&str> = status.busy_snapshots.keys().map(String::as_str).collect();
        warn!(
            "Stopping with {} runs in progress ({}); those runs are abandoned and their scratch builds discarded",
            status.total_active,
            running.join(", ")
        );
    }

    scheduler.shutdown().await
}

async fn run_snapshot(config_manager: &ConfigManager, name: &str) -> Result<()> {
    let config = config_manager.get_current_config();
    let snapshot = config_manager.find_snapshot(name)?;

    let report = SnapshotExecutor::with_system_tools(&config.cp_path, &config.rsync_path)
        .run(&snapshot)
        .await?;

    for outcome in report.pruned.iter().filter(|o| !o.is_removed()) {
        warn!(
            "Generation {} was not pruned: {}",
            outcome.path.display(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    info!(
        "✓ {} written in {:.3}s",
        report.newest_generation.display(),
        report.duration_ms as f64 / 1000.0
    );
    Ok(())
}

async fn list_generations(config_manager: &ConfigManager, name: &str, json: bool) -> Result<()> {
    let snapshot = config_manager.find_snapshot(name)?;
    let summaries = SnapshotCatalog::describe(&snapshot).await?;

    if json {
        println!("{}", listing::render_json(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        if let Some(size_error) = &summary.size_error {
            error!(
                "Can't compute size of {}: {}",
                summary.instance.path.display(),
                size_error
            );
        }
        println!("{}", listing::format_line(summary));
    }
    Ok(())
}

async fn restore_generation(
    config_manager: &ConfigManager,
    name: &str,
    number: u32,
    interval: Option<String>,
) -> Result<()> {
    let config = config_manager.get_current_config();
    let snapshot = config_manager.find_snapshot(name)?;
    let interval = interval.unwrap_or_else(|| snapshot.interval.clone());

    let instance = SnapshotCatalog::find(&snapshot, &interval, number).await?;
    let restored = RestoreExecutor::with_system_tools(&config.rsync_path)
        .restore(&snapshot, &instance)
        .await?;

    info!(
        "✓ Restored {} directories from {}",
        restored,
        instance.path.display()
    );
    Ok(())
}
