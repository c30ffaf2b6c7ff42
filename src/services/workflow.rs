//! One complete pass over the source tree: resolve every order, write the work
//! report and move finished orders to the archive.

use crate::metrics::ScanMetrics;
use crate::models::{Settings, StatusNode};
use crate::services::relocation::{self, RelocationSummary};
use crate::services::resolver::StatusResolver;
use crate::services::work_report;
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};

/// Switches for a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Move `Ready` orders into the target directory
    pub relocate: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { relocate: true }
    }
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Top-level order outcomes in directory-name order
    pub orders: Vec<StatusNode>,
    /// Work report location, `None` if it could not be written
    pub report_path: Option<Utf8PathBuf>,
    /// `None` when relocation was switched off
    pub relocation: Option<RelocationSummary>,
}

impl RunSummary {
    pub fn ready_count(&self) -> usize {
        self.orders.iter().filter(|order| order.is_ready()).count()
    }
}

/// Run the whole pipeline on `start_dir`.
///
/// Only a missing or unlistable start directory fails the run; everything below it
/// is logged and counted in `metrics`. The start directory is only a container of
/// orders: nothing is written into it, and one `Other` order does not hide the rest.
pub fn run(
    settings: &Settings,
    start_dir: &Utf8Path,
    options: RunOptions,
    metrics: &ScanMetrics,
) -> Result<RunSummary> {
    if !start_dir.is_dir() {
        bail!("Start directory does not exist or is not a directory: {}", start_dir);
    }

    tracing::info!("Scanning orders in {}", start_dir);

    let scan_options = settings.scan_options();
    let resolver = StatusResolver::new(&scan_options, metrics);
    let orders = resolver
        .resolve_orders(start_dir)
        .with_context(|| format!("Failed to list start directory: {}", start_dir))?;

    let report_path = work_report::report_file_path(
        &settings.target_dir,
        &settings.report_file_name,
        &chrono::Local::now(),
    );
    let report_path = match work_report::write_report(&report_path, &orders) {
        Ok(()) => Some(report_path),
        Err(e) => {
            tracing::error!("Failed to write work report {}: {}", report_path, e);
            None
        }
    };

    let relocation = if options.relocate {
        Some(relocation::relocate_ready_orders(
            start_dir,
            &settings.target_dir,
            &orders,
            metrics,
        ))
    } else {
        tracing::info!("Relocation disabled, finished orders stay in {}", start_dir);
        None
    };

    let summary = RunSummary {
        orders,
        report_path,
        relocation,
    };
    tracing::info!(
        "Run finished: {} orders, {} ready",
        summary.orders.len(),
        summary.ready_count()
    );

    Ok(summary)
}
