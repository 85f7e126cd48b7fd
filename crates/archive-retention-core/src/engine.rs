use crate::audit::AuditLog;
use crate::cancel::CancelToken;
use crate::config::AppConfig;
use crate::discover;
use crate::error::Error;
use crate::executor::{BatchExecutor, DrainOutcome};
use crate::lock::RunLock;
use crate::policy::RetentionPolicy;
use crate::progress::ProgressReporter;
use crate::reclaim;
use crate::summary::{RunCounters, RunStatus, RunSummary};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Orchestrates one retention run: lock, stream discovery into the batch
/// executor, reclaim empty directories, finalize the audit trail.
pub struct RetentionEngine {
    policy: RetentionPolicy,
    config: AppConfig,
    cancel: CancelToken,
    force_clear_lock: bool,
}

impl RetentionEngine {
    pub fn new(policy: RetentionPolicy, config: AppConfig) -> Self {
        Self {
            policy,
            config,
            cancel: CancelToken::new(),
            force_clear_lock: false,
        }
    }

    pub fn with_force_clear_lock(mut self, force: bool) -> Self {
        self.force_clear_lock = force;
        self
    }

    /// Token shared with signal handlers; setting it stops the run at the
    /// next batch boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Run the retention pipeline:
    /// 1. Gate entry on the cross-process run lock
    /// 2. Stream candidates from discovery into batched deletion
    /// 3. Reclaim empty directories (execute mode, uninterrupted runs only)
    /// 4. Finalize the audit file and summary on every exit path
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<RunSummary, Error> {
        let started = Instant::now();

        if !self.policy.root.is_dir() {
            return Err(Error::PathUnavailable(self.policy.root.clone()));
        }

        // Released via Drop on every path out of this function.
        let mut lock = RunLock::acquire(&self.config.lock_file, self.force_clear_lock)?;

        info!(
            "Mode: {}",
            if self.policy.execute { "EXECUTION" } else { "DRY-RUN" }
        );
        info!(
            "Root: {}, retention: {} days, extensions: {:?}, batch size: {}, workers: {}",
            self.policy.root.display(),
            self.policy.effective_days,
            self.policy.include_extensions,
            self.policy.batch_size,
            self.policy.workers,
        );
        if self.policy.adjusted {
            warn!(
                "Requested retention of {} days raised to the configured minimum of {} days",
                self.policy.requested_days, self.policy.effective_days,
            );
        }

        let audit = AuditLog::create(&self.config.audit_dir)?;
        info!("Audit file: {}", audit.path().display());

        let counters = Arc::new(RunCounters::default());
        let executor = BatchExecutor::new(
            &self.policy,
            Arc::clone(&counters),
            &audit,
            self.cancel.clone(),
        )?;

        reporter.on_run_start(self.policy.execute);

        let candidates = discover::discover(
            &self.policy,
            Arc::clone(&counters),
            self.cancel.clone(),
            reporter,
        );

        let outcome = executor.drain(candidates, reporter);
        let interrupted = outcome == DrainOutcome::Cancelled;

        if self.policy.execute && !interrupted {
            let removed = reclaim::remove_empty_directories(&self.policy.root, &counters);
            info!("Removed {} empty directories", removed);
        } else if interrupted {
            warn!("Run terminated on request; skipping directory reclamation");
        }

        let status = if interrupted {
            RunStatus::Terminated
        } else if self.policy.execute {
            RunStatus::Success
        } else {
            RunStatus::DryRunComplete
        };

        let summary = counters.summarize(status, &self.policy, started.elapsed());
        audit.finalize(&summary)?;
        lock.release();

        summary.log();
        reporter.on_run_complete(&summary);

        Ok(summary)
    }
}
