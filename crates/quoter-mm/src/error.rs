//! Strategy error types.

use quoter_core::ContractId;
use thiserror::Error;

/// Invalid strategy parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} = {value}: {reason}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        reason: &'static str,
    },

    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

impl ConfigError {
    pub(crate) fn out_of_range(field: &'static str, value: i64, reason: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value,
            reason,
        }
    }
}

/// Position service read failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("Position unavailable for contract {contract}: {reason}")]
    Unavailable { contract: ContractId, reason: String },
}

/// Reason the strategy could not be constructed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(#[from] ConfigError),

    #[error("Market data subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Instrument not found: {0}")]
    InstrumentNotFound(String),
}
