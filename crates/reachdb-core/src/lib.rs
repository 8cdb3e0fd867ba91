mod app_config;
mod config;
pub mod orders;
pub mod posts;
pub mod wallet;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use orders::OrderStatus;
pub use posts::PostKind;
pub use wallet::{parse_withdrawal_amount, validate_withdrawal, WithdrawalError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown order status: {0}")]
    UnknownOrderStatus(String),
    #[error("unknown post kind: {0}")]
    UnknownPostKind(String),
}
