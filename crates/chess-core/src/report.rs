//! Human-readable evaluation report.

use std::fmt::Write;

use crate::verdict::EngineVerdict;

/// Render a verdict as a multi-line report: best move with score, the
/// leading variation, search depth and, when reported, WDL percentages.
/// Absent optional fields are left out entirely.
pub fn format_verdict(verdict: &EngineVerdict) -> String {
    let mut out = format!("Best move: {}", verdict.best_move);
    if let Some(score) = verdict.score {
        let _ = write!(out, " (evaluation: {score})");
    }
    if !verdict.variation.moves.is_empty() {
        let _ = write!(out, "\nSuggested line: {}", verdict.variation);
    }
    if let Some(depth) = verdict.depth {
        let _ = write!(out, "\nSearch depth: {depth}");
    }
    if let Some(wdl) = verdict.wdl {
        let _ = write!(
            out,
            "\nWin/Draw/Loss: {}%/{}%/{}%",
            wdl.win, wdl.draw, wdl.loss
        );
    }
    out
}
