//! Pipeline error type.

use promptward_core::{EngineError, GatewayError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{stage} returned unusable output: {reason}")]
    Parse { stage: &'static str, reason: String },
}

impl PipelineError {
    pub(crate) fn parse(stage: &'static str, reason: impl ToString) -> Self {
        Self::Parse {
            stage,
            reason: reason.to_string(),
        }
    }
}
