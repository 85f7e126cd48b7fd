use crate::summary::RunSummary;

/// Trait for reporting run progress.
///
/// CLI implements with indicatif; tests implement to observe batch
/// boundaries. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_run_start(&self, _execute: bool) {}
    fn on_scan_progress(&self, _scanned: u64, _eligible: u64) {}
    fn on_batch_complete(&self, _processed: u64, _errors: u64, _bytes_freed: u64) {}
    fn on_run_complete(&self, _summary: &RunSummary) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
