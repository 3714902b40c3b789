//! Call-site registry: the static table of who may ask a model for what.
//!
//! Fixed at startup. A registry is never mutated after construction; a
//! different table means a different registry.

use promptward_core::Purpose;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A named permission to invoke the model for specific purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    pub id: String,
    pub purposes: BTreeSet<Purpose>,
    /// Owning component, for the compliance report
    pub owner: String,
}

impl CallSite {
    pub fn new(
        id: impl Into<String>,
        purposes: impl IntoIterator<Item = Purpose>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            purposes: purposes.into_iter().collect(),
            owner: owner.into(),
        }
    }

    pub fn permits(&self, purpose: Purpose) -> bool {
        self.purposes.contains(&purpose)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallSiteRegistry {
    sites: BTreeMap<String, CallSite>,
}

impl CallSiteRegistry {
    /// Build from `sites`; a later site with the same id replaces an earlier one.
    pub fn new(sites: impl IntoIterator<Item = CallSite>) -> Self {
        Self {
            sites: sites.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// The built-in call sites, one per pipeline stage.
    pub fn builtin() -> Self {
        Self::new([
            CallSite::new("L1_SCOUT", [Purpose::IntentExtraction], "pipeline::intent"),
            CallSite::new("L1_DIMENSIONS", [Purpose::DimensionExtraction], "pipeline::dimension"),
            CallSite::new("L2_VERIFIER", [Purpose::Verification], "pipeline::verification"),
            CallSite::new("PLANNER", [Purpose::Planning], "agent::planner"),
            CallSite::new(
                "EXECUTOR",
                [Purpose::Execution, Purpose::SubtaskDelegation],
                "agent::executor",
            ),
            CallSite::new("SAFETY_GUARD", [Purpose::SafetyClassification], "guard::safety"),
            CallSite::new("SUMMARIZER", [Purpose::Summarization], "memory::summarizer"),
        ])
    }

    /// A new registry with `overrides` added or replacing sites by id.
    pub fn with_overrides(&self, overrides: impl IntoIterator<Item = CallSite>) -> Self {
        let mut sites = self.sites.clone();
        for site in overrides {
            sites.insert(site.id.clone(), site);
        }
        Self { sites }
    }

    pub fn get(&self, id: &str) -> Option<&CallSite> {
        self.sites.get(id)
    }

    /// All sites, ordered by id.
    pub fn sites(&self) -> impl Iterator<Item = &CallSite> {
        self.sites.values()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
