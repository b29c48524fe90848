//! Board positions as produced by the recognizer and consumed by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};
use thiserror::Error;

/// Fields appended to a placement-only FEN (white to move, no rights, fresh counters).
const DEFAULT_FEN_SUFFIX: &str = " w - - 0 1";

#[derive(Error, Debug)]
pub enum PositionError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    #[error("Illegal position: {0}")]
    IllegalPosition(String),

    #[error("Position has no legal moves")]
    NoLegalMoves,
}

/// A board-state string in FEN. Immutable once built; validated lazily by
/// [`PositionDescriptor::to_position`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionDescriptor(String);

impl PositionDescriptor {
    /// Wrap recognizer output. Surrounding whitespace is dropped and a
    /// placement-only FEN is completed with default side/rights/counters.
    pub fn new(fen: impl AsRef<str>) -> Self {
        let fen = fen.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        if !fen.is_empty() && !fen.contains(' ') {
            return Self(format!("{fen}{DEFAULT_FEN_SUFFIX}"));
        }
        Self(fen)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a legal position. Rejects syntax errors, illegal setups
    /// and positions where the side to move has no legal move.
    pub fn to_position(&self) -> Result<Chess, PositionError> {
        let fen: Fen = self.0.parse()?;
        let pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| PositionError::IllegalPosition(e.to_string()))?;
        if pos.legal_moves().is_empty() {
            return Err(PositionError::NoLegalMoves);
        }
        Ok(pos)
    }
}

impl fmt::Display for PositionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link to a third-party analysis board for this position.
/// Spaces are encoded as underscores, which the viewer accepts.
pub fn analysis_url(base: &str, position: &PositionDescriptor) -> String {
    format!("{}{}", base, position.as_str().replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_start_position_is_valid() {
        let pos = PositionDescriptor::new(START).to_position().unwrap();
        assert_eq!(pos.legal_moves().len(), 20);
    }

    #[test]
    fn test_placement_only_is_completed() {
        let desc = PositionDescriptor::new("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        assert_eq!(
            desc.as_str(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"
        );
        assert!(desc.to_position().is_ok());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = PositionDescriptor::new("not a fen").to_position().unwrap_err();
        assert!(matches!(err, PositionError::InvalidFen(_)));
    }

    #[test]
    fn test_missing_king_is_illegal() {
        let err = PositionDescriptor::new("8/8/8/8/8/8/8/4K3 w - - 0 1")
            .to_position()
            .unwrap_err();
        assert!(matches!(err, PositionError::IllegalPosition(_)));
    }

    #[test]
    fn test_checkmated_side_has_no_moves() {
        // Fool's mate, white to move and mated
        let fen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
        let err = PositionDescriptor::new(fen).to_position().unwrap_err();
        assert!(matches!(err, PositionError::NoLegalMoves));
    }

    #[test]
    fn test_analysis_url_encodes_spaces() {
        let url = analysis_url(
            "https://lichess.org/analysis/standard/",
            &PositionDescriptor::new(START),
        );
        assert_eq!(
            url,
            "https://lichess.org/analysis/standard/rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR_w_KQkq_-_0_1"
        );
    }
}
