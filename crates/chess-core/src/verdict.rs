//! Engine evaluation results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Engine score from the perspective of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawns
    Centipawns(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated)
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Score::Centipawns(cp) => write!(f, "{:.2}", f64::from(cp) / 100.0),
            Score::Mate(n) => write!(f, "Mate (#{n})"),
        }
    }
}

/// Win/draw/loss percentages, always summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wdl {
    pub win: u8,
    pub draw: u8,
    pub loss: u8,
}

impl Wdl {
    /// Build from the per-mille triple UCI engines report. Draw absorbs the
    /// rounding remainder. `None` for an all-zero triple or any component
    /// above 1000.
    pub fn from_permille(win: u32, draw: u32, loss: u32) -> Option<Self> {
        if [win, draw, loss].iter().any(|&v| v > 1000) {
            return None;
        }
        let total = win + draw + loss;
        if total == 0 {
            return None;
        }
        let pct = |v: u32| ((f64::from(v) * 100.0 / f64::from(total)).round() as u8).min(100);
        let win = pct(win);
        let loss = pct(loss).min(100 - win);
        Some(Self {
            win,
            draw: 100 - win - loss,
            loss,
        })
    }
}

/// Leading plies of the principal variation in SAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub first_move_number: u32,
    pub white_to_move: bool,
    pub moves: Vec<String>,
}

impl fmt::Display for Variation {
    /// "1. e4 e5", or "7... Nf6 8. O-O" when black moves first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut number = self.first_move_number;
        let mut white = self.white_to_move;
        for (i, san) in self.moves.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if white {
                write!(f, "{number}. {san}")?;
            } else if i == 0 {
                write!(f, "{number}... {san}")?;
            } else {
                f.write_str(san)?;
            }
            if !white {
                number += 1;
            }
            white = !white;
        }
        Ok(())
    }
}

/// Result of one engine evaluation. Produced once, discarded after formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineVerdict {
    /// Best move in SAN
    pub best_move: String,
    pub score: Option<Score>,
    pub variation: Variation,
    /// Depth actually reached
    pub depth: Option<u32>,
    pub wdl: Option<Wdl>,
}
