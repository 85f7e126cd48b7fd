use crate::discover::FileCandidate;
use crate::error::Error;
use crate::summary::RunSummary;
use chrono::Utc;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Outcome recorded for one processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Deleted,
    WouldDelete,
    Error,
}

impl AuditOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOutcome::Deleted => "DELETED",
            AuditOutcome::WouldDelete => "WOULD-DELETE",
            AuditOutcome::Error => "ERROR",
        }
    }
}

/// Append-only, pipe-delimited audit trail; one file per run, one line per
/// processed file. The system of record for compliance.
///
/// Every record is flushed as it is written, so a crash immediately after a
/// deletion still leaves the line proving it.
pub struct AuditLog {
    writer: Mutex<csv::Writer<File>>,
    path: PathBuf,
}

impl AuditLog {
    pub fn create(dir: &Path) -> Result<AuditLog, Error> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "retention_run_{}.log",
            Utc::now().format("%Y%m%d_%H%M%S_%f")
        ));
        let file = File::create(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'|')
            .flexible(true)
            .from_writer(file);
        writer.write_record(["path", "size", "modified", "processed_at", "outcome"])?;
        writer.flush()?;
        Ok(AuditLog {
            writer: Mutex::new(writer),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Called after the filesystem operation for the file
    /// has concluded, never before.
    pub fn record(&self, candidate: &FileCandidate, outcome: AuditOutcome) -> Result<(), Error> {
        let size = candidate.size.to_string();
        let modified = candidate.modified.to_rfc3339();
        let processed_at = Utc::now().to_rfc3339();

        let mut writer = self.writer.lock().unwrap();
        writer.write_record([
            candidate.path.to_string_lossy().as_ref(),
            size.as_str(),
            modified.as_str(),
            processed_at.as_str(),
            outcome.as_str(),
        ])?;
        writer.flush()?;
        Ok(())
    }

    /// Write the run summary as the trailing lines of the audit file.
    /// Called exactly once per run, from every exit path.
    pub fn finalize(&self, summary: &RunSummary) -> Result<(), Error> {
        let mut writer = self.writer.lock().unwrap();
        for line in summary.lines() {
            writer.write_record([format!("# {}", line)])?;
        }
        writer.write_record([format!("# status: {}", summary.status)])?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::policy::RetentionPolicy;
    use crate::summary::{RunCounters, RunStatus};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::tempdir;

    fn candidate(path: &str, size: u64) -> FileCandidate {
        FileCandidate {
            path: PathBuf::from(path),
            size,
            modified: Utc::now(),
            parent: PathBuf::from("/archive"),
        }
    }

    #[test]
    fn test_record_writes_pipe_delimited_line() {
        let dir = tempdir().unwrap();
        let audit = AuditLog::create(dir.path()).unwrap();

        audit
            .record(&candidate("/archive/a.lca", 2048), AuditOutcome::Deleted)
            .unwrap();

        let body = fs::read_to_string(audit.path()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "path|size|modified|processed_at|outcome");
        let fields: Vec<&str> = lines[1].split('|').collect();
        assert_eq!(fields[0], "/archive/a.lca");
        assert_eq!(fields[1], "2048");
        assert_eq!(fields[4], "DELETED");
    }

    #[test]
    fn test_finalize_appends_summary_and_status() {
        let dir = tempdir().unwrap();
        let audit = AuditLog::create(dir.path()).unwrap();
        audit
            .record(&candidate("/archive/b.lca", 10), AuditOutcome::WouldDelete)
            .unwrap();

        let counters = RunCounters::default();
        counters.record_scanned();
        let policy = RetentionPolicy::new(
            PathBuf::from("/archive"),
            365,
            vec![],
            false,
            &AppConfig::default(),
        );
        let summary =
            counters.summarize(RunStatus::DryRunComplete, &policy, Duration::from_secs(2));
        audit.finalize(&summary).unwrap();

        let body = fs::read_to_string(audit.path()).unwrap();
        let last = body.lines().last().unwrap();
        assert_eq!(last, "# status: DRY-RUN COMPLETED");
    }

    #[test]
    fn test_one_audit_file_per_run() {
        let dir = tempdir().unwrap();
        let first = AuditLog::create(dir.path()).unwrap();
        let second = AuditLog::create(dir.path()).unwrap();
        assert_ne!(first.path(), second.path());
    }
}
