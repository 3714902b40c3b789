//! # promptward engine
//!
//! The prompt compiler: a [`SectionRegistry`] of pure generators, a
//! [`PolicyEngine`] holding the per-purpose ruleset, and the [`Orchestrator`]
//! that turns a [`Context`](promptward_core::Context) into a sealed
//! [`PromptArtifact`] plus its persisted
//! [`PromptReport`](promptward_core::PromptReport).
//!
//! # Determinism
//!
//! Generators read only the context. Ordering, budgeting and hashing use no
//! clock or randomness; the prompt id and report timestamp are the only
//! per-call values, and neither feeds a hash.

pub mod artifact;
pub mod hash;
pub mod orchestrator;
pub mod policy;
pub mod registry;
pub mod sections;

pub use artifact::PromptArtifact;
pub use orchestrator::Orchestrator;
pub use policy::{Disposition, PolicyEngine, PolicyTable, PurposePolicy};
pub use registry::{Generator, SectionRegistry};
pub use sections::default_registry;
