//! UCI to SAN conversion for engine output.

use shakmaty::{san::San, uci::UciMove, Chess, Position};

use crate::verdict::Variation;

/// Convert a single UCI move to SAN at a given position.
pub fn uci_to_san(pos: &Chess, uci_str: &str) -> Option<String> {
    let uci_move: UciMove = uci_str.parse().ok()?;
    let legal_move = uci_move.to_move(pos).ok()?;
    Some(San::from_move(pos, legal_move).to_string())
}

/// Convert the first `max_plies` moves of a UCI line to a SAN variation
/// starting at `start`. Stops at the first move that does not parse or is
/// not legal, so the result may be shorter than requested.
pub fn uci_line_to_variation(start: &Chess, uci_moves: &[String], max_plies: usize) -> Variation {
    let mut pos = start.clone();
    let mut moves = Vec::new();

    for uci_str in uci_moves.iter().take(max_plies) {
        let legal_move = match uci_str
            .parse::<UciMove>()
            .ok()
            .and_then(|m| m.to_move(&pos).ok())
        {
            Some(m) => m,
            None => break,
        };
        moves.push(San::from_move(&pos, legal_move.clone()).to_string());
        pos.play_unchecked(legal_move);
    }

    Variation {
        first_move_number: start.fullmoves().get(),
        white_to_move: start.turn().is_white(),
        moves,
    }
}
