//! Era config (§4.6, §6): template/system weights, transition gating,
//! transition/entry effects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `operator ∈ {above, below}` for pressure/entity-count conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Above,
    Below,
}

impl Comparator {
    #[must_use]
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Above => value > threshold,
            Self::Below => value < threshold,
        }
    }
}

/// `operator ∈ {exists, ended}` for occurrence conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceTest {
    Exists,
    Ended,
}

/// Tagged union of the four condition kinds named in §4.6 step 4.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionCondition {
    #[serde(rename_all = "camelCase")]
    Pressure {
        pressure_id: String,
        operator: Comparator,
        threshold: f64,
    },
    #[serde(rename_all = "camelCase")]
    EntityCount {
        entity_kind: String,
        subtype: Option<String>,
        status: Option<String>,
        operator: Comparator,
        threshold: f64,
    },
    Occurrence {
        subtype: String,
        operator: OccurrenceTest,
    },
    #[serde(rename_all = "camelCase")]
    Time {
        min_ticks: u64,
    },
}

/// Pressure deltas and other effects applied when a transition fires, or
/// (for `entryEffects`) when the next era becomes current.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureEffects {
    #[serde(default)]
    pub pressure_changes: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EraConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub template_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub system_modifiers: BTreeMap<String, f64>,
    #[serde(default)]
    pub pressure_modifiers: BTreeMap<String, f64>,
    /// Minimum ticks this era must live before transition evaluation even
    /// starts (§4.6 step 2).
    #[serde(default = "default_min_era_length")]
    pub min_era_length: u64,
    /// Cooldown after `min_era_length` before conditions are re-evaluated
    /// (§4.6 step 3).
    #[serde(default = "default_transition_cooldown")]
    pub transition_cooldown: u64,
    /// `None` means "use the default heuristic `eraAge > 2 * minEraLength`"
    /// (§4.6 step 4); `Some(vec![])` means "no extra gating" beyond the
    /// min-length/cooldown checks.
    #[serde(default)]
    pub transition_conditions: Option<Vec<TransitionCondition>>,
    #[serde(default)]
    pub transition_effects: PressureEffects,
    #[serde(default)]
    pub entry_effects: PressureEffects,
}

const fn default_min_era_length() -> u64 {
    50
}

const fn default_transition_cooldown() -> u64 {
    10
}

impl EraConfig {
    #[must_use]
    pub fn template_weight(&self, template_id: &str) -> f64 {
        self.template_weights.get(template_id).copied().unwrap_or(1.0)
    }

    #[must_use]
    pub fn system_modifier(&self, system_id: &str) -> f64 {
        self.system_modifiers.get(system_id).copied().unwrap_or(1.0)
    }

    #[must_use]
    pub fn pressure_modifier(&self, pressure_id: &str) -> f64 {
        self.pressure_modifiers.get(pressure_id).copied().unwrap_or(0.0)
    }
}
