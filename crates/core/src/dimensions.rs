//! Structured dimensions accumulated per session.
//!
//! Two groups of values:
//! - **A-set** ([`ActionSlots`]): concrete what/who/when/where/how/constraints
//!   slots. Incoming values replace earlier ones; progress is reported as a
//!   completeness fraction.
//! - **B-set** ([`CognitiveSignals`]): five continuous 0–1 signals, smoothed
//!   with an exponential moving average so one noisy turn cannot swing
//!   downstream execution gating.

use serde::{Deserialize, Serialize};

/// Default EMA smoothing factor.
pub const DEFAULT_ALPHA: f32 = 0.3;

// ── A-set ──────────────────────────────────────────────────────────────────

/// Concrete action slots extracted from the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

impl ActionSlots {
    pub const TOTAL: usize = 6;

    /// Slots as `(name, value)` pairs in canonical order.
    pub fn entries(&self) -> [(&'static str, Option<&str>); Self::TOTAL] {
        [
            ("what", self.what.as_deref()),
            ("who", self.who.as_deref()),
            ("when", self.when.as_deref()),
            ("where", self.where_.as_deref()),
            ("how", self.how.as_deref()),
            ("constraints", self.constraints.as_deref()),
        ]
    }

    /// Number of slots holding a non-blank value.
    pub fn filled(&self) -> usize {
        self.entries()
            .iter()
            .filter(|(_, v)| v.is_some_and(|s| !s.trim().is_empty()))
            .count()
    }

    /// Filled slots / total slots, in [0, 1].
    pub fn completeness(&self) -> f32 {
        self.filled() as f32 / Self::TOTAL as f32
    }

    /// Overwrite slots with any non-blank incoming value.
    pub fn merge(&mut self, incoming: &ActionSlots) {
        fn take(slot: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                *slot = Some(v.to_string());
            }
        }
        take(&mut self.what, &incoming.what);
        take(&mut self.who, &incoming.who);
        take(&mut self.when, &incoming.when);
        take(&mut self.where_, &incoming.where_);
        take(&mut self.how, &incoming.how);
        take(&mut self.constraints, &incoming.constraints);
    }
}

// ── B-set ──────────────────────────────────────────────────────────────────

/// Continuous cognitive signals, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CognitiveSignals {
    pub urgency: f32,
    pub emotional_load: f32,
    pub ambiguity: f32,
    pub reversibility: f32,
    pub user_confidence: f32,
}

impl CognitiveSignals {
    pub fn entries(&self) -> [(&'static str, f32); 5] {
        [
            ("urgency", self.urgency),
            ("emotional_load", self.emotional_load),
            ("ambiguity", self.ambiguity),
            ("reversibility", self.reversibility),
            ("user_confidence", self.user_confidence),
        ]
    }

    fn slots_mut(&mut self) -> [&mut f32; 5] {
        [
            &mut self.urgency,
            &mut self.emotional_load,
            &mut self.ambiguity,
            &mut self.reversibility,
            &mut self.user_confidence,
        ]
    }
}

// ── Snapshot & update ──────────────────────────────────────────────────────

/// Snapshot of a session's dimensions, as carried in a `Context`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub slots: ActionSlots,
    #[serde(default)]
    pub signals: CognitiveSignals,
    /// Number of updates folded into this snapshot
    #[serde(default)]
    pub turns: u32,
}

impl Dimensions {
    pub fn completeness(&self) -> f32 {
        self.slots.completeness()
    }
}

/// One turn's worth of extracted dimensions. Absent signals leave the
/// running average untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionUpdate {
    #[serde(default)]
    pub slots: ActionSlots,
    #[serde(default)]
    pub urgency: Option<f32>,
    #[serde(default)]
    pub emotional_load: Option<f32>,
    #[serde(default)]
    pub ambiguity: Option<f32>,
    #[serde(default)]
    pub reversibility: Option<f32>,
    #[serde(default)]
    pub user_confidence: Option<f32>,
}

impl DimensionUpdate {
    fn signals(&self) -> [Option<f32>; 5] {
        [
            self.urgency,
            self.emotional_load,
            self.ambiguity,
            self.reversibility,
            self.user_confidence,
        ]
    }
}

// ── Tracker ────────────────────────────────────────────────────────────────

/// `new = α·incoming + (1−α)·previous`
pub fn ema(previous: f32, incoming: f32, alpha: f32) -> f32 {
    alpha * incoming + (1.0 - alpha) * previous
}

/// Per-session accumulator for [`Dimensions`].
#[derive(Debug, Clone)]
pub struct DimensionTracker {
    alpha: f32,
    state: Dimensions,
    seen: [bool; 5],
}

impl Default for DimensionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DimensionTracker {
    pub fn new() -> Self {
        Self::with_alpha(DEFAULT_ALPHA)
    }

    /// Alpha is clamped into (0, 1]; non-finite values fall back to the default.
    pub fn with_alpha(alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(f32::EPSILON, 1.0)
        } else {
            DEFAULT_ALPHA
        };
        Self {
            alpha,
            state: Dimensions::default(),
            seen: [false; 5],
        }
    }

    /// Resume from a persisted snapshot. Every signal counts as observed
    /// once at least one turn has been folded in.
    pub fn resume(snapshot: Dimensions, alpha: f32) -> Self {
        let mut tracker = Self::with_alpha(alpha);
        tracker.seen = [snapshot.turns > 0; 5];
        tracker.state = snapshot;
        tracker
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Fold one turn into the running state.
    pub fn apply(&mut self, update: &DimensionUpdate) {
        self.state.slots.merge(&update.slots);

        let alpha = self.alpha;
        let incoming = update.signals();
        for (i, slot) in self.state.signals.slots_mut().into_iter().enumerate() {
            let Some(value) = incoming[i].filter(|v| v.is_finite()) else {
                continue;
            };
            let value = value.clamp(0.0, 1.0);
            *slot = if self.seen[i] {
                ema(*slot, value, alpha).clamp(0.0, 1.0)
            } else {
                value
            };
            self.seen[i] = true;
        }

        self.state.turns = self.state.turns.saturating_add(1);
        tracing::debug!(
            turns = self.state.turns,
            completeness = self.state.completeness(),
            "dimensions updated"
        );
    }

    pub fn snapshot(&self) -> Dimensions {
        self.state.clone()
    }
}
