use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod events;
pub mod records;
pub mod session;

pub use app_config::{AppConfig, Timing};
pub use config::{load_app_config, load_app_config_from_env};
pub use events::{progress_percent, ExtractionEvent};
pub use records::{total_pages_for, ProductInfo, ReviewRecord, REVIEWS_PER_PAGE};
pub use session::{ExtractionSettings, SessionState, SessionSummary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
