//! Service error type.

use crate::GameId;
use chess_core::Side;
use chess_engine::EngineError;
use thiserror::Error;

/// Errors reported by [`GameService`](crate::GameService) operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The rules core rejected the request or found itself inconsistent.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Another operation holds the game's lock. Retrying is up to the caller.
    #[error("game {0} is busy")]
    GameBusy(GameId),

    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// The client acted on a position the game has already left.
    #[error("client is at position {client}, game is at position {server}")]
    PositionMismatch { client: u32, server: u32 },

    #[error("{0} is not to move")]
    NotYourTurn(Side),
}

impl ServiceError {
    /// True for errors the surrounding layer should answer with a generic
    /// "invalid request".
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            ServiceError::Engine(_)
                | ServiceError::PositionMismatch { .. }
                | ServiceError::NotYourTurn(_)
        )
    }
}
