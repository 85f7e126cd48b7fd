use crate::audit::{AuditLog, AuditOutcome};
use crate::cancel::CancelToken;
use crate::discover::FileCandidate;
use crate::error::Error;
use crate::policy::RetentionPolicy;
use crate::progress::ProgressReporter;
use crate::summary::RunCounters;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, warn};

/// How a drain of the candidate stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed,
    Cancelled,
}

/// Pulls candidates into fixed-size batches and deletes each batch on a
/// bounded worker pool. Cancellation is honored only between batches, so an
/// in-flight batch always drains and no partially-audited batch exists.
pub struct BatchExecutor<'a> {
    policy: &'a RetentionPolicy,
    counters: Arc<RunCounters>,
    audit: &'a AuditLog,
    cancel: CancelToken,
    pool: rayon::ThreadPool,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        policy: &'a RetentionPolicy,
        counters: Arc<RunCounters>,
        audit: &'a AuditLog,
        cancel: CancelToken,
    ) -> Result<Self, Error> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(policy.workers)
            .build()
            .map_err(|err| Error::Other(format!("could not build worker pool: {}", err)))?;
        Ok(Self {
            policy,
            counters,
            audit,
            cancel,
            pool,
        })
    }

    pub fn drain(
        &self,
        mut candidates: impl Iterator<Item = FileCandidate>,
        reporter: &dyn ProgressReporter,
    ) -> DrainOutcome {
        let mut batch: Vec<FileCandidate> = Vec::with_capacity(self.policy.batch_size);

        loop {
            batch.clear();
            while batch.len() < self.policy.batch_size {
                match candidates.next() {
                    Some(candidate) => batch.push(candidate),
                    None => break,
                }
            }

            if batch.is_empty() {
                return if self.cancel.is_cancelled() {
                    DrainOutcome::Cancelled
                } else {
                    DrainOutcome::Completed
                };
            }

            // A signal during the fill must not start a new batch; only a
            // batch already dispatched is allowed to drain.
            if self.cancel.is_cancelled() {
                return DrainOutcome::Cancelled;
            }

            self.run_batch(&batch);
            reporter.on_batch_complete(
                self.counters.deleted(),
                self.counters.errors(),
                self.counters.bytes_freed(),
            );

            if self.cancel.is_cancelled() {
                return DrainOutcome::Cancelled;
            }
        }
    }

    fn run_batch(&self, batch: &[FileCandidate]) {
        self.pool.install(|| {
            batch.par_iter().for_each(|candidate| {
                if self.policy.execute {
                    self.delete_one(candidate);
                } else {
                    debug!("Would delete: {}", candidate.path.display());
                    self.counters.record_deleted(candidate.size);
                    self.record_audit(candidate, AuditOutcome::WouldDelete);
                }
            });
        });
    }

    fn delete_one(&self, candidate: &FileCandidate) {
        match self.delete_with_retry(&candidate.path) {
            Ok(()) => {
                debug!("Deleted file: {}", candidate.path.display());
                self.counters.record_deleted(candidate.size);
                self.record_audit(candidate, AuditOutcome::Deleted);
            }
            Err(err) => {
                error!("Failed to delete {}: {}", candidate.path.display(), err);
                self.counters.record_error();
                self.record_audit(candidate, AuditOutcome::Error);
            }
        }
    }

    fn delete_with_retry(&self, path: &Path) -> io::Result<()> {
        let mut attempt: u32 = 0;
        loop {
            match fs::remove_file(path) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        "Delete attempt {} failed for {}: {}; retrying",
                        attempt,
                        path.display(),
                        err
                    );
                    thread::sleep(self.policy.retry_backoff * attempt);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn record_audit(&self, candidate: &FileCandidate, outcome: AuditOutcome) {
        // An audit write failure must not abort the batch, but it must be
        // loud: the audit file is the system of record.
        if let Err(err) = self.audit.record(candidate, outcome) {
            error!(
                "Could not write audit record for {}: {}",
                candidate.path.display(),
                err
            );
        }
    }
}
