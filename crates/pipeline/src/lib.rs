//! # promptward pipeline
//!
//! The stages that actually talk to a model. Each stage builds a prompt
//! for its purpose through the [`Orchestrator`](promptward_engine::Orchestrator),
//! sends it through the [`LlmGateway`](promptward_gateway::LlmGateway) under
//! its own call site, and parses the JSON reply into typed output.
//!
//! | Stage | Call site | Output |
//! |---|---|---|
//! | [`IntentExtractor`] | `L1_SCOUT` | up to three [`IntentCandidate`]s |
//! | [`DimensionExtractor`] | `L1_DIMENSIONS` | a [`DimensionUpdate`](promptward_core::DimensionUpdate) |
//! | [`Verifier`] | `L2_VERIFIER` | a [`Verification`] |

pub mod dimension;
pub mod error;
pub mod intent;
mod json;
pub mod stage;
pub mod verification;

#[cfg(test)]
mod test_helpers;

pub use dimension::DimensionExtractor;
pub use error::PipelineError;
pub use intent::{IntentAction, IntentCandidate, IntentExtraction, IntentExtractor};
pub use stage::{StageOutput, StageRunner};
pub use verification::{Verdict, Verification, Verifier};
