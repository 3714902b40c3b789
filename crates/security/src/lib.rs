//! Security module for promptward: compliance logging, artifact sealing,
//! and the rogue-prompt scan.
//!
//! Provides:
//! - **Compliance log**: structured record of every model call, bypass
//!   attempt and policy swap, forwarded to pluggable sinks
//! - **Seal**: HMAC-SHA256 keys that mark artifacts as orchestrator-built
//! - **Rogue scan**: static check that nothing outside the gateway talks to
//!   a model provider directly

pub mod audit;
pub mod scan;
pub mod seal;

pub use audit::{AuditEntry, AuditEvent, AuditOutcome, AuditSink, ComplianceLog, JsonlSink, TracingSink};
pub use scan::{RogueScanner, ScanOutcome, Violation};
pub use seal::{SealError, SealKey};
