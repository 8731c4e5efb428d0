//! Top-level `EngineConfig` (§6).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::ActionDomainConfig;
use crate::era::EraConfig;
use crate::pressure::PressureSpec;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipBudget {
    pub max_per_simulation_tick: usize,
    pub max_per_growth_phase: usize,
}

/// Desired ratios of entities per kind/prominence and of relationship
/// diversity (Glossary: "Distribution targets").
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionTargets {
    #[serde(default)]
    pub prominence_targets: BTreeMap<String, f64>,
    #[serde(default)]
    pub relationship_diversity_target: Option<f64>,
}

/// Config for emergent location discovery (§4.x, Glossary "Emergent
/// discovery"). Left intentionally small — the actual theme composition is
/// a domain-specific lore concern (out of scope, §1), this only carries the
/// numeric gating the engine itself needs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergentDiscoveryConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Minimum number of ticks between discovery attempts.
    #[serde(default = "default_discovery_cooldown")]
    pub cooldown_ticks: u64,
}

const fn default_discovery_cooldown() -> u64 {
    25
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub epoch_length: u64,
    pub simulation_ticks_per_growth: u64,
    pub max_ticks: u64,
    pub target_entities_per_kind: BTreeMap<String, usize>,
    pub relationship_budget: RelationshipBudget,
    #[serde(default)]
    pub pressures: BTreeMap<String, PressureSpec>,
    pub eras: Vec<EraConfig>,
    #[serde(default)]
    pub action_domains: Vec<ActionDomainConfig>,
    #[serde(default)]
    pub distribution_targets: Option<DistributionTargets>,
    #[serde(default)]
    pub emergent_discovery: EmergentDiscoveryConfig,
    /// Hard cap on total entities; a termination condition (§4.2).
    pub hard_cap: usize,
    /// Deficit-boost exponent `α` from §4.3 (default 2).
    #[serde(default = "default_deficit_alpha")]
    pub deficit_alpha: f64,
    /// Diversity-dampening ceiling `maxRunsPerTemplate` from §4.3.
    #[serde(default = "default_max_runs_per_template")]
    pub max_runs_per_template: u32,
    /// `growthMetrics` smoothing window, Open Question 2 (decided in
    /// DESIGN.md): epochs of history averaged for `averageGrowthRate`.
    #[serde(default = "default_growth_metrics_window")]
    pub growth_metrics_window: usize,
    /// RNG seed; identical seed + config -> byte-identical export (§8).
    pub seed: u64,
}

const fn default_deficit_alpha() -> f64 {
    2.0
}

const fn default_max_runs_per_template() -> u32 {
    50
}

const fn default_growth_metrics_window() -> usize {
    10
}

impl EngineConfig {
    #[must_use]
    pub fn era(&self, id: &str) -> Option<&EraConfig> {
        self.eras.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn era_after(&self, id: &str) -> Option<&EraConfig> {
        let idx = self.eras.iter().position(|e| e.id == id)?;
        self.eras.get(idx + 1)
    }

    #[must_use]
    pub fn first_era(&self) -> Option<&EraConfig> {
        self.eras.first()
    }
}
