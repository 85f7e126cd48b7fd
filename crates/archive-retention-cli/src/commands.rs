use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "archive-retention")]
#[command(about = "Retires aged files from archive trees under a retention policy", long_about = None)]
pub struct Cli {
    /// Root path of the archive tree to process
    #[arg(long, value_name = "PATH")]
    pub archive_path: PathBuf,

    /// Retention age in days; raised to the configured minimum if lower
    #[arg(long, value_name = "DAYS")]
    pub retention_days: u32,

    /// File extension to include; repeatable (default: .lca)
    #[arg(long = "include", value_name = "EXT")]
    pub include_extensions: Vec<String>,

    /// Actually delete files (absent = dry run)
    #[arg(long)]
    pub execute: bool,

    /// Eligible files per deletion batch
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Worker threads per batch (1-16)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Clear a lock file left behind by a crashed run
    #[arg(long)]
    pub force_clear_lock: bool,

    /// Override the run-lock file path
    #[arg(long, value_name = "PATH")]
    pub lock_file: Option<PathBuf>,

    /// Show periodic progress while scanning
    #[arg(long)]
    pub show_scan_progress: bool,

    /// Show per-batch progress while deleting
    #[arg(long)]
    pub show_delete_progress: bool,

    /// Suppress progress output entirely
    #[arg(long, conflicts_with_all = ["show_scan_progress", "show_delete_progress"])]
    pub quiet: bool,
}
