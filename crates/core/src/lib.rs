//! # promptward core
//!
//! Domain types, traits, and error definitions for the promptward prompt
//! governance engine. This crate has **no runtime dependencies** beyond
//! serialization: it defines the vocabulary every other crate speaks.
//!
//! ## Design Philosophy
//!
//! The engine is a compiler from a typed request [`Context`] to an auditable
//! prompt. Everything a section generator may read lives in the `Context`;
//! everything persisted for audit lives in a [`PromptReport`]. Backends that
//! touch the outside world (model providers, report stores) are traits here
//! and implementations live in their own crates.

pub mod context;
pub mod dimensions;
pub mod error;
pub mod message;
pub mod provider;
pub mod purpose;
pub mod report;
pub mod section;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use context::{Context, MemorySnippet, Provenance, RuntimeInfo, Skill, WorkspaceFile};
pub use dimensions::{ActionSlots, CognitiveSignals, DimensionTracker, DimensionUpdate, Dimensions};
pub use error::{EngineError, Error, GatewayError, ProviderError, Result, StoreError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use purpose::Purpose;
pub use report::{PromptReport, ReportStore};
pub use section::{CacheClass, RequiredEmpty, SectionId, SectionOutput};
