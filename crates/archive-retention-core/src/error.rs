use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Archive path unavailable: {0}")]
    PathUnavailable(PathBuf),

    #[error("Another instance holds the run lock (pid {pid:?})")]
    LockHeld { pid: Option<u32> },

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Audit error: {0}")]
    Audit(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}
