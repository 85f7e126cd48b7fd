pub mod audit;
pub mod cancel;
pub mod config;
pub mod discover;
pub mod engine;
pub mod error;
pub mod executor;
pub mod lock;
pub mod policy;
pub mod progress;
pub mod reclaim;
pub mod summary;

pub use cancel::CancelToken;
pub use config::AppConfig;
pub use engine::RetentionEngine;
pub use error::Error;
pub use policy::RetentionPolicy;
pub use progress::{ProgressReporter, SilentReporter};
pub use summary::{RunStatus, RunSummary};
