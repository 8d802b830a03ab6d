//! Error types for the strike crate.

use thiserror::Error;

/// Errors raised while configuring the estimator or ingesting sensor data.
///
/// The per-sample update path never fails; errors only come from
/// construction, configuration loading and log parsing.
#[derive(Debug, Error)]
pub enum StrikeError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl StrikeError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StrikeError>;
