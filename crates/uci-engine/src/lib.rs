//! Process-per-call UCI engine sessions.
//!
//! Each evaluation spawns its own engine, applies a fixed option profile,
//! searches under a depth and wall-clock ceiling, and shuts the process
//! down again.

pub mod error;
pub mod session;

pub use error::EngineError;
pub use session::{EngineCommand, EngineOptions, EngineSession, SearchLimits, PV_PREVIEW_PLIES};

use chess_core::{EngineVerdict, PositionDescriptor};

/// Open a session, evaluate one position and close the session again,
/// whatever the evaluation outcome.
pub async fn analyze_once(
    command: &EngineCommand,
    options: &EngineOptions,
    position: &PositionDescriptor,
    limits: SearchLimits,
) -> Result<EngineVerdict, EngineError> {
    // Reject bad positions before paying for a process spawn
    position.to_position()?;

    let mut session = EngineSession::open(command, options).await?;
    let result = session.evaluate(position, limits).await;
    session.close().await;
    result
}
