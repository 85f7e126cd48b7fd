use ::config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;

/// Installation-level settings. Loaded from an optional `Config.toml`;
/// every field has a default so a bare install works with no file at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Floor applied to any requested retention period.
    pub minimum_retention_days: u32,
    /// Extensions assumed when the operator supplies none.
    pub default_extensions: Vec<String>,
    /// Number of eligible files handed to the worker pool at a time.
    pub batch_size: usize,
    /// Worker threads per batch. Clamped to 1..=16 by the policy.
    pub workers: usize,
    /// Deletion attempts per file before recording an error.
    pub max_retries: u32,
    /// Base backoff between deletion retries; grows linearly per attempt.
    pub retry_backoff_ms: u64,
    /// Well-known lock file path shared by every run on this host.
    pub lock_file: PathBuf,
    /// Directory receiving one append-only audit file per run.
    pub audit_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            minimum_retention_days: 90,
            default_extensions: vec!["lca".to_string()],
            batch_size: 500,
            workers: 4,
            max_retries: 3,
            retry_backoff_ms: 200,
            lock_file: std::env::temp_dir().join("archive-retention.lock"),
            audit_dir: PathBuf::from("./retention_actions"),
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.minimum_retention_days, 90);
        assert_eq!(config.default_extensions, vec!["lca".to_string()]);
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_retries, 3);
        assert!(config.lock_file.ends_with("archive-retention.lock"));
    }
}
