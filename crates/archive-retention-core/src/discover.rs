use crate::cancel::CancelToken;
use crate::policy::RetentionPolicy;
use crate::progress::ProgressReporter;
use crate::summary::RunCounters;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use walkdir::WalkDir;

/// Scan progress is reported once per this many scanned files.
const SCAN_PROGRESS_INTERVAL: u64 = 500;

/// A file that matched the retention policy. Produced transiently; held only
/// until its batch is processed.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub parent: PathBuf,
}

/// Streaming traversal of the archive tree. Never materializes the file
/// list; the executor pulls candidates one batch at a time.
pub struct CandidateIter<'a> {
    walker: walkdir::IntoIter,
    policy: RetentionPolicy,
    counters: Arc<RunCounters>,
    cancel: CancelToken,
    reporter: &'a dyn ProgressReporter,
}

pub fn discover<'a>(
    policy: &RetentionPolicy,
    counters: Arc<RunCounters>,
    cancel: CancelToken,
    reporter: &'a dyn ProgressReporter,
) -> CandidateIter<'a> {
    CandidateIter {
        walker: WalkDir::new(&policy.root).into_iter(),
        policy: policy.clone(),
        counters,
        cancel,
        reporter,
    }
}

impl Iterator for CandidateIter<'_> {
    type Item = FileCandidate;

    fn next(&mut self) -> Option<FileCandidate> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    // One unreadable entry never aborts the scan.
                    warn!("Skipping unreadable entry: {}", err);
                    self.counters.record_discovery_error();
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            self.counters.record_scanned();

            // Cadence tracks scanned files, not eligible ones, so trees with
            // nothing eligible still show scan activity.
            let scanned = self.counters.scanned();
            if scanned % SCAN_PROGRESS_INTERVAL == 0 {
                self.reporter
                    .on_scan_progress(scanned, self.counters.eligible());
            }

            if !self.policy.matches_extension(entry.path()) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(
                        "Could not read metadata for {}: {}",
                        entry.path().display(),
                        err
                    );
                    self.counters.record_discovery_error();
                    continue;
                }
            };

            let modified: DateTime<Utc> = match metadata.modified() {
                Ok(time) => time.into(),
                Err(err) => {
                    warn!(
                        "No modification time for {}: {}",
                        entry.path().display(),
                        err
                    );
                    self.counters.record_discovery_error();
                    continue;
                }
            };

            if !self.policy.is_eligible(modified) {
                continue;
            }

            self.counters.record_eligible();
            let parent = entry
                .path()
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default();
            return Some(FileCandidate {
                path: entry.into_path(),
                size: metadata.len(),
                modified,
                parent,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::progress::SilentReporter;
    use filetime::FileTime;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::tempdir;

    fn backdate(path: &Path, days: i64) {
        let mtime = FileTime::from_unix_time(
            Utc::now().timestamp() - days * 24 * 60 * 60,
            0,
        );
        filetime::set_file_mtime(path, mtime).unwrap();
    }

    fn policy_for(root: &Path, days: u32) -> RetentionPolicy {
        let mut config = AppConfig::default();
        config.minimum_retention_days = 1;
        RetentionPolicy::new(root.to_path_buf(), days, vec![], false, &config)
    }

    #[test]
    fn test_yields_only_old_matching_files() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("2023");
        fs::create_dir_all(&sub).unwrap();

        let old = sub.join("old.lca");
        fs::write(&old, b"aged archive").unwrap();
        backdate(&old, 500);

        let young = sub.join("young.lca");
        fs::write(&young, b"recent archive").unwrap();

        let other_ext = sub.join("old.txt");
        fs::write(&other_ext, b"aged but wrong type").unwrap();
        backdate(&other_ext, 500);

        let counters = Arc::new(RunCounters::default());
        let policy = policy_for(dir.path(), 365);
        let candidates: Vec<_> = discover(
            &policy,
            Arc::clone(&counters),
            CancelToken::new(),
            &SilentReporter,
        )
        .collect();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].path, old);
        assert_eq!(candidates[0].size, 12);
        assert_eq!(candidates[0].parent, sub);
        assert_eq!(counters.scanned(), 3);
        assert_eq!(counters.eligible(), 1);
    }

    #[test]
    fn test_cancellation_stops_traversal() {
        let dir = tempdir().unwrap();
        for i in 0..10 {
            let path = dir.path().join(format!("f{}.lca", i));
            fs::write(&path, b"x").unwrap();
            backdate(&path, 500);
        }

        let counters = Arc::new(RunCounters::default());
        let cancel = CancelToken::new();
        let policy = policy_for(dir.path(), 365);
        let mut iter = discover(
            &policy,
            Arc::clone(&counters),
            cancel.clone(),
            &SilentReporter,
        );

        assert!(iter.next().is_some());
        cancel.cancel();
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let counters = Arc::new(RunCounters::default());
        let policy = policy_for(&missing, 365);
        let candidates: Vec<_> = discover(
            &policy,
            Arc::clone(&counters),
            CancelToken::new(),
            &SilentReporter,
        )
        .collect();

        // The unreadable root is a discovery error, not a crash.
        assert!(candidates.is_empty());
        assert_eq!(counters.scanned(), 0);
    }

    #[test]
    fn test_scan_progress_fires_without_eligible_files() {
        struct CountingReporter {
            calls: AtomicU64,
            last_scanned: AtomicU64,
        }
        impl ProgressReporter for CountingReporter {
            fn on_scan_progress(&self, scanned: u64, _eligible: u64) {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.last_scanned.store(scanned, Ordering::SeqCst);
            }
        }

        let dir = tempdir().unwrap();
        // 1200 files of a foreign extension: all scanned, none eligible.
        for i in 0..1200 {
            fs::write(dir.path().join(format!("f{}.txt", i)), b"x").unwrap();
        }

        let counters = Arc::new(RunCounters::default());
        let reporter = CountingReporter {
            calls: AtomicU64::new(0),
            last_scanned: AtomicU64::new(0),
        };
        let policy = policy_for(dir.path(), 365);
        let candidates: Vec<_> = discover(
            &policy,
            Arc::clone(&counters),
            CancelToken::new(),
            &reporter,
        )
        .collect();

        assert!(candidates.is_empty());
        assert_eq!(counters.scanned(), 1200);
        // Fired at 500 and 1000 scanned files.
        assert_eq!(reporter.calls.load(Ordering::SeqCst), 2);
        assert_eq!(reporter.last_scanned.load(Ordering::SeqCst), 1000);
    }
}
