use crate::summary::RunCounters;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Remove directories left empty after deletion, deepest first. The root
/// itself is never evaluated or removed.
///
/// Runs as a separate pass after all deletions are durable; a directory whose
/// files sat in a later batch is only seen after that batch completed.
pub fn remove_empty_directories(root: &Path, counters: &RunCounters) -> u64 {
    let mut removed = 0;

    // contents_first yields children before parents, so a directory whose
    // subdirectories were just removed is itself seen empty in the same pass.
    for entry in walkdir::WalkDir::new(root).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry during reclamation: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_dir() || entry.depth() == 0 {
            continue;
        }

        let is_empty = match fs::read_dir(entry.path()) {
            Ok(mut entries) => entries.next().is_none(),
            Err(err) => {
                warn!(
                    "Could not inspect directory {}: {}",
                    entry.path().display(),
                    err
                );
                continue;
            }
        };
        if !is_empty {
            continue;
        }

        match fs::remove_dir(entry.path()) {
            Ok(()) => {
                debug!("Removed empty directory: {}", entry.path().display());
                counters.record_dir_removed();
                removed += 1;
            }
            Err(err) => {
                warn!(
                    "Could not remove empty directory {}: {}",
                    entry.path().display(),
                    err
                );
            }
        }
    }

    removed
}
