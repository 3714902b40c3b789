//! # promptward gateway
//!
//! The single path to a language model. [`LlmGateway::invoke`] accepts only
//! a sealed [`PromptArtifact`](promptward_engine::PromptArtifact) and the id
//! of a registered [`CallSite`]; every other shape is rejected and counted
//! as a bypass attempt. Accepted calls are written to the compliance log
//! before the provider is contacted.

pub mod call_site;
pub mod compliance;
pub mod gateway;

pub use call_site::{CallSite, CallSiteRegistry};
pub use compliance::ComplianceReport;
pub use gateway::{InvokeSettings, LlmGateway};
