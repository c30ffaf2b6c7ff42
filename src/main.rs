//! ListMaker - work-list generator and order tracker for a panel cutting shop
//!
//! Main entry point for the command-line tool.
//!
//! # Execution Flow
//!
//! 1. Parse arguments ([`Args`])
//! 2. Initialize logging → `logs/listmaker.<date>` plus console
//! 3. Load `listMaker_settings.xml` ([`ConfigManager`]); when it is missing, write the
//!    default template and exit so it can be edited first
//! 4. Scan the start directory (argument or `SourceDir`), write work lists, completion
//!    markers and the work report, then move finished orders into `TargetDir`
//! 5. Log the run summary
//!
//! Anything that goes wrong inside the order tree is logged and counted; only settings
//! and start-directory problems end the program with an error.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use listmaker::cli::Args;
use listmaker::config::{SETTINGS_FILE_NAME, SettingsLoad};
use listmaker::metrics::ScanMetrics;
use listmaker::models::config::resolve_against;
use listmaker::services::workflow::{self, RunOptions};
use listmaker::{APP_NAME, ConfigManager, VERSION};

fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = listmaker::logging::setup_logging(&args.log_dir, APP_NAME, args.debug, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let current_dir = current_dir()?;
    let settings_path = match &args.settings {
        Some(path) => resolve_against(&current_dir, path.as_str()),
        None => default_settings_path()?,
    };

    let manager = ConfigManager::new(&settings_path);
    let mut settings = match manager.load()? {
        SettingsLoad::Loaded(settings) => settings,
        SettingsLoad::DefaultWritten(path) => {
            println!(
                "Default settings written to {}. Edit the file and run {} again.",
                path, APP_NAME
            );
            return Ok(());
        }
    };

    let start_dir = match &args.start_dir {
        Some(dir) => resolve_against(&current_dir, dir.as_str()),
        None => settings.source_dir.clone(),
    };

    // The log folder and the archive may live inside the order tree
    let log_dir = resolve_against(&current_dir, args.log_dir.as_str());
    let target_dir = settings.target_dir.clone();
    for own_dir in [&log_dir, &target_dir] {
        if settings.ignore_nested_dir(&start_dir, own_dir) {
            tracing::debug!("Excluding {} from the scan", own_dir);
        }
    }

    let metrics = ScanMetrics::new();
    let options = RunOptions {
        relocate: !args.no_relocate,
    };

    let summary = workflow::run(&settings, &start_dir, options, &metrics)
        .with_context(|| format!("Run over {} failed", start_dir))?;

    if let Some(report) = &summary.report_path {
        tracing::info!("Work report: {}", report);
    }
    tracing::info!("Start directory: {}", start_dir);
    metrics.log_summary();

    Ok(())
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().context("Failed to determine the working directory")?;
    Utf8PathBuf::try_from(dir).context("Working directory is not valid UTF-8")
}

/// `listMaker_settings.xml` in the folder holding the executable
fn default_settings_path() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the executable")?;
    let exe = Utf8PathBuf::try_from(exe).context("Executable path is not valid UTF-8")?;
    let dir = exe.parent().unwrap_or(Utf8Path::new("."));
    Ok(dir.join(SETTINGS_FILE_NAME))
}
