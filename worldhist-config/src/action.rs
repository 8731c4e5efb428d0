//! Catalyst action domain config (§4.7, §6).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Requirements gating an action's eligibility, beyond the agent's
/// `actionDomains` membership (§4.7 step 2).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequirements {
    pub min_prominence: Option<String>,
    #[serde(default)]
    pub required_relationships: Vec<String>,
    #[serde(default)]
    pub required_pressures: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfig {
    pub id: String,
    pub description: String,
    pub base_weight: f64,
    pub base_success_chance: f64,
    #[serde(default)]
    pub pressure_modifiers: BTreeMap<String, f64>,
    #[serde(default)]
    pub requirements: ActionRequirements,
    /// Opts into the prominence feedback described in §4.7 step 6.
    #[serde(default)]
    pub prominence_feedback: bool,
    #[serde(default = "default_prominence_up_chance")]
    pub prominence_up_chance: f64,
    #[serde(default = "default_prominence_down_chance")]
    pub prominence_down_chance: f64,
}

const fn default_prominence_up_chance() -> f64 {
    0.1
}

const fn default_prominence_down_chance() -> f64 {
    0.05
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDomainConfig {
    pub id: String,
    pub description: String,
    pub actions: Vec<ActionConfig>,
}
