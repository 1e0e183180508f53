//! Domain error types.

use crate::domain::universe::UniverseError;

/// Top-level error type for sniper.
#[derive(Debug, thiserror::Error)]
pub enum SniperError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("provider failure for {source_name}: {reason}")]
    Provider { source_name: String, reason: String },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("contract violation: {reason}")]
    ContractViolation { reason: String },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SniperError {
    pub fn provider(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SniperError::Provider {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn contract(reason: impl Into<String>) -> Self {
        SniperError::ContractViolation {
            reason: reason.into(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SniperError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SniperError> for std::process::ExitCode {
    fn from(err: &SniperError) -> Self {
        let code: u8 = match err {
            SniperError::Io(_) => 1,
            SniperError::ConfigParse { .. }
            | SniperError::ConfigMissing { .. }
            | SniperError::ConfigInvalid { .. }
            | SniperError::Universe(_) => 2,
            SniperError::Provider { .. } => 3,
            SniperError::ContractViolation { .. } => 4,
            SniperError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
