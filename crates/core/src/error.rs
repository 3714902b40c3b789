//! Error types for the promptward domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the top-level [`Error`]
//! wraps them for callers that only want one type.

use crate::purpose::Purpose;
use crate::section::SectionId;
use thiserror::Error;

/// The top-level error type for all promptward operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Prompt assembly ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Model access ---
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Audit persistence ---
    #[error("Report store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors raised while building a prompt.
///
/// `UnknownPurpose`, `UnregisteredSection`, `DuplicateSection` and
/// `PolicyConflict` are configuration errors and surface at startup.
/// `MislabelledSection` is also a configuration error, but it only shows up
/// when the generator runs. `InvalidContext` is a request-shape error.
/// `Persistence` means the audit trail could not be written and the build
/// must not be used.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No policy registered for purpose '{0}'")]
    UnknownPurpose(Purpose),

    #[error("Section '{0}' is referenced but has no registered generator")]
    UnregisteredSection(SectionId),

    #[error("Section '{0}' is already registered")]
    DuplicateSection(SectionId),

    #[error("Generator for section '{expected}' produced section '{produced}'")]
    MislabelledSection { expected: SectionId, produced: SectionId },

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("Required section '{section}' produced no content: {reason}")]
    RequiredSectionEmpty { section: SectionId, reason: String },

    #[error("Policy for '{purpose}' lists section '{section}' as both required and banned")]
    PolicyConflict { purpose: Purpose, section: SectionId },

    #[error("Report persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

/// Errors raised by the LLM gateway.
///
/// Every variant except `Provider` is a security violation and is counted
/// as a bypass attempt before it is returned.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unknown call site: {0}")]
    UnknownCallSite(String),

    #[error("Call site '{site}' is not permitted to request purpose '{purpose}'")]
    PurposeNotAllowed { site: String, purpose: Purpose },

    #[error("Payload is not a genuine orchestrator artifact: {0}")]
    NotAnArtifact(String),

    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),
}

impl GatewayError {
    /// Whether this error is a security rejection (as opposed to a downstream failure).
    pub fn is_violation(&self) -> bool {
        !matches!(self, Self::Provider(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}
