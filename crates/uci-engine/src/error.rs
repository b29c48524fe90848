//! Engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The executable could not be started or failed its handshake.
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(#[from] chess_core::PositionError),

    /// Crash, timeout or unparseable output during an evaluation.
    #[error("Engine error: {0}")]
    Failed(String),
}
