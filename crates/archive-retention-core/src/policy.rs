use crate::config::AppConfig;
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};

/// Immutable per-run retention policy, constructed once at startup.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    pub root: PathBuf,
    /// Files last modified strictly before this instant are eligible.
    pub cutoff: DateTime<Utc>,
    pub requested_days: u32,
    pub effective_days: u32,
    /// True when the requested period was raised to the configured minimum.
    pub adjusted: bool,
    /// Lowercase extensions without the leading dot.
    pub include_extensions: Vec<String>,
    pub batch_size: usize,
    pub workers: usize,
    pub execute: bool,
    pub max_retries: u32,
    pub retry_backoff: std::time::Duration,
}

impl RetentionPolicy {
    pub fn new(
        root: PathBuf,
        requested_days: u32,
        include_extensions: Vec<String>,
        execute: bool,
        config: &AppConfig,
    ) -> Self {
        let effective_days = requested_days.max(config.minimum_retention_days);
        let adjusted = effective_days != requested_days;

        let extensions = if include_extensions.is_empty() {
            config.default_extensions.clone()
        } else {
            include_extensions
        };
        let include_extensions: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self {
            root,
            cutoff: Utc::now() - Duration::days(i64::from(effective_days)),
            requested_days,
            effective_days,
            adjusted,
            include_extensions,
            batch_size: config.batch_size.max(1),
            workers: config.workers.clamp(1, 16),
            execute,
            max_retries: config.max_retries,
            retry_backoff: std::time::Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                self.include_extensions.iter().any(|inc| *inc == ext)
            }
            None => false,
        }
    }

    pub fn is_eligible(&self, modified: DateTime<Utc>) -> bool {
        modified < self.cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn test_retention_floored_to_minimum() {
        let policy = RetentionPolicy::new(
            PathBuf::from("/tmp/archive"),
            10,
            vec![],
            true,
            &test_config(),
        );
        assert_eq!(policy.requested_days, 10);
        assert_eq!(policy.effective_days, 90);
        assert!(policy.adjusted);
    }

    #[test]
    fn test_retention_above_minimum_untouched() {
        let policy = RetentionPolicy::new(
            PathBuf::from("/tmp/archive"),
            365,
            vec![],
            false,
            &test_config(),
        );
        assert_eq!(policy.effective_days, 365);
        assert!(!policy.adjusted);
    }

    #[test]
    fn test_extension_normalization() {
        let policy = RetentionPolicy::new(
            PathBuf::from("/tmp/archive"),
            365,
            vec![".LCA".to_string(), "Txt".to_string()],
            false,
            &test_config(),
        );
        assert_eq!(policy.include_extensions, vec!["lca", "txt"]);
        assert!(policy.matches_extension(Path::new("a/b/old.lca")));
        assert!(policy.matches_extension(Path::new("a/b/OLD.LCA")));
        assert!(policy.matches_extension(Path::new("note.txt")));
        assert!(!policy.matches_extension(Path::new("image.png")));
        assert!(!policy.matches_extension(Path::new("no_extension")));
    }

    #[test]
    fn test_default_extensions_when_none_given() {
        let policy = RetentionPolicy::new(
            PathBuf::from("/tmp/archive"),
            365,
            vec![],
            false,
            &test_config(),
        );
        assert_eq!(policy.include_extensions, vec!["lca"]);
    }

    #[test]
    fn test_cutoff_eligibility() {
        let policy = RetentionPolicy::new(
            PathBuf::from("/tmp/archive"),
            365,
            vec![],
            false,
            &test_config(),
        );
        assert!(policy.is_eligible(Utc::now() - Duration::days(500)));
        assert!(!policy.is_eligible(Utc::now() - Duration::days(10)));
    }

    #[test]
    fn test_workers_clamped() {
        let mut config = test_config();
        config.workers = 64;
        let policy =
            RetentionPolicy::new(PathBuf::from("/tmp"), 365, vec![], false, &config);
        assert_eq!(policy.workers, 16);

        config.workers = 0;
        let policy =
            RetentionPolicy::new(PathBuf::from("/tmp"), 365, vec![], false, &config);
        assert_eq!(policy.workers, 1);
    }
}
