use crate::policy::RetentionPolicy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Terminal state of a run. Finalized exactly once, on every exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    DryRunComplete,
    Terminated,
    /// Fatal errors surface as `Err` before a summary exists, so the engine
    /// never finalizes with this status; callers map those errors to it for
    /// reporting and exit-code purposes.
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::DryRunComplete => "DRY-RUN COMPLETED",
            RunStatus::Terminated => "TERMINATED",
            RunStatus::Failed => "FAILED",
        }
    }

    /// Process exit code. Terminated is deliberately distinct from both
    /// success and generic failure so operators can tell "stopped on
    /// request" from "crashed".
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Success | RunStatus::DryRunComplete => 0,
            RunStatus::Terminated => 130,
            RunStatus::Failed => 1,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters shared across deletion workers. The only mutable state workers
/// touch; everything is an atomic increment.
#[derive(Debug, Default)]
pub struct RunCounters {
    scanned: AtomicU64,
    eligible: AtomicU64,
    deleted: AtomicU64,
    bytes_freed: AtomicU64,
    errors: AtomicU64,
    discovery_errors: AtomicU64,
    dirs_removed: AtomicU64,
}

impl RunCounters {
    pub fn record_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eligible(&self) {
        self.eligible.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deleted(&self, bytes: u64) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
        self.bytes_freed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discovery_error(&self) {
        self.discovery_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dir_removed(&self) {
        self.dirs_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scanned(&self) -> u64 {
        self.scanned.load(Ordering::Relaxed)
    }

    pub fn eligible(&self) -> u64 {
        self.eligible.load(Ordering::Relaxed)
    }

    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Relaxed)
    }

    pub fn bytes_freed(&self) -> u64 {
        self.bytes_freed.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn summarize(
        &self,
        status: RunStatus,
        policy: &RetentionPolicy,
        duration: Duration,
    ) -> RunSummary {
        RunSummary {
            status,
            scanned: self.scanned.load(Ordering::Relaxed),
            eligible: self.eligible.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            bytes_freed: self.bytes_freed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            discovery_errors: self.discovery_errors.load(Ordering::Relaxed),
            dirs_removed: self.dirs_removed.load(Ordering::Relaxed),
            requested_days: policy.requested_days,
            effective_days: policy.effective_days,
            adjusted: policy.adjusted,
            execute: policy.execute,
            duration,
        }
    }
}

/// Aggregate result of a run, written to the audit file and the log.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub status: RunStatus,
    pub scanned: u64,
    pub eligible: u64,
    pub deleted: u64,
    pub bytes_freed: u64,
    pub errors: u64,
    pub discovery_errors: u64,
    pub dirs_removed: u64,
    pub requested_days: u32,
    pub effective_days: u32,
    pub adjusted: bool,
    pub execute: bool,
    pub duration: Duration,
}

impl RunSummary {
    pub fn lines(&self) -> Vec<String> {
        let deleted_label = if self.execute { "deleted" } else { "would delete" };
        let mut lines = vec![
            format!(
                "scanned={} eligible={} {}={} bytes_freed={} errors={} discovery_errors={} empty_dirs_removed={}",
                self.scanned,
                self.eligible,
                deleted_label,
                self.deleted,
                self.bytes_freed,
                self.errors,
                self.discovery_errors,
                self.dirs_removed,
            ),
            format!(
                "retention: {} days requested, {} days applied",
                self.requested_days, self.effective_days,
            ),
        ];
        if self.adjusted {
            lines.push(format!(
                "retention period raised from {} to the configured minimum of {} days",
                self.requested_days, self.effective_days,
            ));
        }
        lines.push(format!(
            "completed in {:.2}s with status {}",
            self.duration.as_secs_f64(),
            self.status,
        ));
        lines
    }

    pub fn log(&self) {
        for line in self.lines() {
            info!("{}", line);
        }
    }
}
