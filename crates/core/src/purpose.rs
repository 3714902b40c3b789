//! Purpose: the fixed reason a prompt is being built.
//!
//! Purposes drive policy lookup and call-site permissions. The set is closed
//! and known at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a prompt is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    /// L1: turn a transcript into candidate interpretations.
    IntentExtraction,
    /// Focused extraction of A-set slots and B-set signals.
    DimensionExtraction,
    Planning,
    Execution,
    /// L2: check a proposed plan or result against the request.
    Verification,
    SafetyClassification,
    Summarization,
    #[serde(rename = "sub-task-delegation")]
    SubtaskDelegation,
}

impl Purpose {
    /// Every purpose, in declaration order.
    pub const ALL: [Purpose; 8] = [
        Purpose::IntentExtraction,
        Purpose::DimensionExtraction,
        Purpose::Planning,
        Purpose::Execution,
        Purpose::Verification,
        Purpose::SafetyClassification,
        Purpose::Summarization,
        Purpose::SubtaskDelegation,
    ];

    /// The wire name (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntentExtraction => "intent-extraction",
            Self::DimensionExtraction => "dimension-extraction",
            Self::Planning => "planning",
            Self::Execution => "execution",
            Self::Verification => "verification",
            Self::SafetyClassification => "safety-classification",
            Self::Summarization => "summarization",
            Self::SubtaskDelegation => "sub-task-delegation",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown purpose '{s}'"))
    }
}
