//! Position analysis seam over the UCI engine.

use async_trait::async_trait;
use chess_core::{EngineVerdict, PositionDescriptor};
use uci_engine::{analyze_once, EngineCommand, EngineError, EngineOptions, SearchLimits};

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, position: &PositionDescriptor) -> Result<EngineVerdict, EngineError>;
}

/// Spawns a fresh engine process for every position; nothing is pooled.
#[derive(Debug, Clone)]
pub struct EngineAnalyzer {
    command: EngineCommand,
    options: EngineOptions,
    limits: SearchLimits,
}

impl EngineAnalyzer {
    pub fn new(command: EngineCommand, options: EngineOptions, limits: SearchLimits) -> Self {
        Self {
            command,
            options,
            limits,
        }
    }
}

#[async_trait]
impl Analyzer for EngineAnalyzer {
    async fn analyze(&self, position: &PositionDescriptor) -> Result<EngineVerdict, EngineError> {
        analyze_once(&self.command, &self.options, position, self.limits).await
    }
}
