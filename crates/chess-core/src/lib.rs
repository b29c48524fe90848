//! Board positions, engine verdicts and the text rendered to users.

pub mod confidence;
pub mod notation;
pub mod position;
pub mod report;
pub mod verdict;

pub use confidence::{format_confidence, ConfidenceScore, ConfidenceTier};
pub use position::{analysis_url, PositionDescriptor, PositionError};
pub use report::format_verdict;
pub use verdict::{EngineVerdict, Score, Variation, Wdl};
