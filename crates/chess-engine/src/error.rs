//! Engine error type.

use chess_core::FenError;
use thiserror::Error;

/// Errors raised by the rules and search core.
///
/// Both families are fatal for the current operation: a contract violation
/// means the caller passed inconsistent input, an invariant violation means
/// the engine's own bookkeeping disagrees with itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("invalid arrangement: {0}")]
    InvalidArrangement(String),

    #[error(transparent)]
    Fen(#[from] FenError),
}

impl EngineError {
    pub(crate) fn contract(message: impl Into<String>) -> Self {
        EngineError::ContractViolation(message.into())
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        EngineError::InvariantViolation(message.into())
    }
}
