//! Recognizer self-reported certainty and its user-facing tiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HIGH_CONFIDENCE: f64 = 0.95;
pub const MEDIUM_CONFIDENCE: f64 = 0.85;

/// Appended to the confidence line when the score falls below the medium tier.
pub const PHOTO_QUALITY_REMINDER: &str = "For better results, make sure that:\n\
    - the whole board is visible in the photo\n\
    - the lighting is good\n\
    - the pieces are clearly distinguishable";

#[derive(Error, Debug, PartialEq)]
#[error("Confidence must be a number in [0, 1], got {0}")]
pub struct ConfidenceError(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ConfidenceScore(f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceScore {
    pub fn new(value: f64) -> Result<Self, ConfidenceError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfidenceError(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn tier(self) -> ConfidenceTier {
        if self.0 >= HIGH_CONFIDENCE {
            ConfidenceTier::High
        } else if self.0 >= MEDIUM_CONFIDENCE {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

impl ConfidenceTier {
    pub fn marker(self) -> &'static str {
        match self {
            ConfidenceTier::High => "🟢 high",
            ConfidenceTier::Medium => "🟡 medium",
            ConfidenceTier::Low => "🔴 low",
        }
    }
}

impl fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

/// The confidence message: percentage, tier marker and, for low scores,
/// the photo-quality reminder.
pub fn format_confidence(score: ConfidenceScore) -> String {
    let tier = score.tier();
    let mut line = format!("Recognition confidence: {score} ({})", tier.marker());
    if tier == ConfidenceTier::Low {
        line.push_str("\n\n");
        line.push_str(PHOTO_QUALITY_REMINDER);
    }
    line
}
