use crate::error::Error;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// On-disk record of the current lock holder. Diagnostic only: the advisory
/// flock on the file is the correctness mechanism, never the recorded pid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
}

/// Exclusive cross-process run lock.
///
/// A holder that exits for any reason, clean or not, drops its flock with the
/// process, so a lock file whose flock is obtainable is stale by definition
/// and gets overwritten. A denied flock means the holder is alive.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    file: Option<File>,
}

impl RunLock {
    /// Acquire the run lock, recovering stale lock files automatically.
    ///
    /// With `force_clear`, an existing lock file that is not actively held is
    /// unlinked and recreated while the flock is held, so no second process
    /// can slip in between the removal and the re-create. A lock that is
    /// actively held is never cleared, forced or not.
    pub fn acquire(path: &Path, force_clear: bool) -> Result<RunLock, Error> {
        let mut clear_pending = force_clear;

        // A few attempts absorb the window where a releasing holder unlinks
        // the file between our open and our flock.
        for _ in 0..5 {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?;

            match file.try_lock_exclusive() {
                Ok(()) => {
                    if !path_matches_handle(path, &file) {
                        // The previous holder unlinked this inode after we
                        // opened it. Start over on the fresh path.
                        debug!("Lock file replaced during acquisition; retrying");
                        continue;
                    }

                    if let Some(record) = read_record(path) {
                        warn!(
                            "Removing stale lock left by pid {} (acquired {})",
                            record.pid, record.acquired_at
                        );
                        if clear_pending {
                            // Forced clear: remove and recreate under the
                            // held flock, then re-verify on the next pass.
                            clear_pending = false;
                            info!("Force-clearing lock file {}", path.display());
                            fs::remove_file(path)?;
                            continue;
                        }
                    }

                    write_record(&mut file)?;
                    info!("Acquired run lock at {}", path.display());
                    return Ok(RunLock {
                        path: path.to_path_buf(),
                        file: Some(file),
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    let pid = read_record(path).map(|record| record.pid);
                    if force_clear {
                        warn!(
                            "--force-clear-lock requested but the lock is actively held (pid {:?}); refusing to clear",
                            pid
                        );
                    }
                    return Err(Error::LockHeld { pid });
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::Lock(format!(
            "could not stabilize lock file at {}",
            path.display()
        )))
    }

    /// Release the lock. Idempotent; also invoked from `Drop` so every exit
    /// path, including panics and early returns, releases.
    pub fn release(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        // Only delete a record that still names us as holder.
        match read_record(&self.path) {
            Some(record) if record.pid == std::process::id() => {
                // Remove while the flock is still held so no observer sees an
                // unlocked file that still carries a record.
                #[cfg(unix)]
                if let Err(err) = fs::remove_file(&self.path) {
                    warn!("Could not remove lock file {}: {}", self.path.display(), err);
                }
                #[cfg(not(unix))]
                if let Err(err) = file.set_len(0) {
                    warn!("Could not truncate lock file {}: {}", self.path.display(), err);
                }
            }
            Some(record) => {
                warn!(
                    "Lock record now names pid {}; leaving lock file in place",
                    record.pid
                );
            }
            None => {}
        }

        if let Err(err) = FileExt::unlock(&file) {
            warn!("Could not unlock {}: {}", self.path.display(), err);
        }
        debug!("Released run lock at {}", self.path.display());
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn write_record(file: &mut File) -> Result<(), Error> {
    let record = LockRecord {
        pid: std::process::id(),
        acquired_at: Utc::now(),
    };
    let body = serde_json::to_string(&record)
        .map_err(|err| Error::Lock(format!("could not encode lock record: {}", err)))?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(body.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Best-effort read of an existing lock record. Unparseable or empty content
/// reads as no record.
fn read_record(path: &Path) -> Option<LockRecord> {
    let body = fs::read_to_string(path).ok()?;
    serde_json::from_str(body.trim()).ok()
}

#[cfg(unix)]
fn path_matches_handle(path: &Path, file: &File) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(path), file.metadata()) {
        (Ok(on_disk), Ok(held)) => {
            on_disk.dev() == held.dev() && on_disk.ino() == held.ino()
        }
        _ => false,
    }
}

#[cfg(not(unix))]
fn path_matches_handle(_path: &Path, _file: &File) -> bool {
    // Release never unlinks on this platform, so the path cannot change
    // identity under us.
    true
}
