//! Shared domain types and process configuration for the sentiment dashboard.

pub mod app_config;
pub mod config;
pub mod terms;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, CorsOrigins, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use terms::parse_search_terms;
pub use types::{Item, RawItem, Sentiment, Source};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
