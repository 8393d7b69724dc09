use thiserror::Error;

use kidledger_config::ConfigError;
use kidledger_core::CoreError;

/// Unified error for the facade and the jobs binary.
#[derive(Debug, Error)]
pub enum KidLedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type KidLedgerResult<T> = Result<T, KidLedgerError>;
