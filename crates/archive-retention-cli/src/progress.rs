use archive_retention_core::{ProgressReporter, RunSummary};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// CLI progress reporter using an indicatif spinner.
///
/// Scan and deletion interleave (discovery streams straight into the batch
/// executor), so a single spinner carries whichever message is freshest.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    show_scan: bool,
    show_delete: bool,
}

impl CliReporter {
    pub fn new(show_scan: bool, show_delete: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            show_scan,
            show_delete,
        }
    }

    fn set_message(&self, message: String) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(message);
        }
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_run_start(&self, execute: bool) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(if execute {
            "Processing archive tree..."
        } else {
            "Scanning archive tree (dry run)..."
        });
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        let mut guard = self.bar.lock().unwrap();
        *guard = Some(pb);
    }

    fn on_scan_progress(&self, scanned: u64, eligible: u64) {
        if self.show_scan {
            self.set_message(format!(
                "Scanned {} files, {} eligible",
                scanned, eligible
            ));
        }
    }

    fn on_batch_complete(&self, processed: u64, errors: u64, bytes_freed: u64) {
        if self.show_delete {
            self.set_message(format!(
                "Processed {} files ({} errors, {} freed)",
                processed,
                errors,
                HumanBytes(bytes_freed)
            ));
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m {}: {} scanned, {} eligible, {} processed in {:.2}s",
            summary.status,
            summary.scanned,
            summary.eligible,
            summary.deleted,
            summary.duration.as_secs_f64()
        );
    }
}
