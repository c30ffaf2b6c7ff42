// Run metrics module
//
// Counts what a single pass over the order tree did, so the end of the log says how
// much was dispatched, rewritten, persisted and moved.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for one scan
///
/// Uses atomic operations so the counters can be shared by reference with every
/// component that reports into them.
#[derive(Debug)]
pub struct ScanMetrics {
    /// Directories whose entries were listed
    pub directories_scanned: AtomicUsize,

    /// Directories that could not be listed
    pub directories_unreadable: AtomicUsize,

    /// Work lists written
    pub manifests_written: AtomicUsize,

    /// Work lists that failed to write
    pub manifest_failures: AtomicUsize,

    /// Part files whose panel names were rewritten
    pub part_files_rewritten: AtomicUsize,

    /// Part files that could not be parsed or written
    pub part_file_failures: AtomicUsize,

    /// Panels left alone because their dimensions did not parse
    pub panels_skipped: AtomicUsize,

    /// Completion markers written
    pub markers_written: AtomicUsize,

    /// Completion markers loaded back
    pub markers_loaded: AtomicUsize,

    /// Completion markers that could not be read, parsed or written
    pub marker_failures: AtomicUsize,

    /// Situations that need an operator (facade lists, unclassifiable folders)
    pub manual_actions: AtomicUsize,

    /// Finished orders moved to the archive
    pub orders_relocated: AtomicUsize,

    /// Finished orders that could not be moved
    pub relocation_failures: AtomicUsize,

    /// Scan start time
    start_time: Instant,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            directories_scanned: AtomicUsize::new(0),
            directories_unreadable: AtomicUsize::new(0),
            manifests_written: AtomicUsize::new(0),
            manifest_failures: AtomicUsize::new(0),
            part_files_rewritten: AtomicUsize::new(0),
            part_file_failures: AtomicUsize::new(0),
            panels_skipped: AtomicUsize::new(0),
            markers_written: AtomicUsize::new(0),
            markers_loaded: AtomicUsize::new(0),
            marker_failures: AtomicUsize::new(0),
            manual_actions: AtomicUsize::new(0),
            orders_relocated: AtomicUsize::new(0),
            relocation_failures: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_directory_scanned(&self) {
        self.directories_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_directory_unreadable(&self) {
        self.directories_unreadable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_manifest_written(&self) {
        self.manifests_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_manifest_failure(&self) {
        self.manifest_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_part_file_rewritten(&self) {
        self.part_files_rewritten.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_part_file_failure(&self) {
        self.part_file_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_panels_skipped(&self, count: usize) {
        self.panels_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_marker_written(&self) {
        self.markers_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_marker_loaded(&self) {
        self.markers_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_marker_failure(&self) {
        self.marker_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_manual_action(&self) {
        self.manual_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_relocated(&self) {
        self.orders_relocated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relocation_failure(&self) {
        self.relocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Read a counter
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }

    /// Time since the scan started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Total number of recoverable failures recorded
    pub fn failures(&self) -> usize {
        Self::get(&self.directories_unreadable)
            + Self::get(&self.manifest_failures)
            + Self::get(&self.part_file_failures)
            + Self::get(&self.marker_failures)
            + Self::get(&self.relocation_failures)
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Scan Summary ===");
        tracing::info!("Elapsed: {:.6}s", self.elapsed().as_secs_f64());
        tracing::info!(
            "Directories: {} scanned, {} unreadable",
            Self::get(&self.directories_scanned),
            Self::get(&self.directories_unreadable)
        );
        tracing::info!(
            "Work lists: {} written, {} failed",
            Self::get(&self.manifests_written),
            Self::get(&self.manifest_failures)
        );
        tracing::info!(
            "Part files: {} rewritten, {} failed, {} panels skipped",
            Self::get(&self.part_files_rewritten),
            Self::get(&self.part_file_failures),
            Self::get(&self.panels_skipped)
        );
        tracing::info!(
            "Completion markers: {} written, {} loaded, {} failed",
            Self::get(&self.markers_written),
            Self::get(&self.markers_loaded),
            Self::get(&self.marker_failures)
        );
        tracing::info!(
            "Orders: {} relocated, {} failed to move",
            Self::get(&self.orders_relocated),
            Self::get(&self.relocation_failures)
        );

        let manual = Self::get(&self.manual_actions);
        if manual > 0 {
            tracing::warn!("{} folder(s) need manual attention, see warnings above", manual);
        }
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = ScanMetrics::new();
        assert_eq!(ScanMetrics::get(&metrics.directories_scanned), 0);
        assert_eq!(metrics.failures(), 0);
    }

    #[test]
    fn test_record_counters() {
        let metrics = ScanMetrics::new();

        metrics.record_directory_scanned();
        metrics.record_directory_scanned();
        metrics.record_manifest_written();
        metrics.record_panels_skipped(3);
        metrics.record_manual_action();

        assert_eq!(ScanMetrics::get(&metrics.directories_scanned), 2);
        assert_eq!(ScanMetrics::get(&metrics.manifests_written), 1);
        assert_eq!(ScanMetrics::get(&metrics.panels_skipped), 3);
        assert_eq!(ScanMetrics::get(&metrics.manual_actions), 1);
    }

    #[test]
    fn test_failures_total() {
        let metrics = ScanMetrics::new();

        metrics.record_directory_unreadable();
        metrics.record_marker_failure();
        metrics.record_relocation_failure();

        assert_eq!(metrics.failures(), 3);
    }

    #[test]
    fn test_elapsed() {
        let metrics = ScanMetrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.elapsed().as_millis() >= 10);
    }
}
