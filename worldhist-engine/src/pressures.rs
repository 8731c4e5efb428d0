//! Pressure update and distribution-driven feedback (§4.9).

use std::collections::BTreeMap;

use worldhist_config::EngineConfig;
use worldhist_core::Kind;
use worldhist_graph::Graph;

/// Deltas queued by templates/systems/catalyst handlers during tick *t*,
/// applied to the pressure update at the start of tick *t+1* (§5 ordering
/// guarantee 2) — never visible within the tick that produced them.
#[derive(Debug, Default, Clone)]
pub struct PendingDeltas(BTreeMap<String, f64>);

impl PendingDeltas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, changes: &BTreeMap<String, f64>) {
        for (id, delta) in changes {
            *self.0.entry(id.clone()).or_insert(0.0) += delta;
        }
    }

    pub fn add_one(&mut self, id: impl Into<String>, delta: f64) {
        *self.0.entry(id.into()).or_insert(0.0) += delta;
    }

    fn take(&mut self) -> BTreeMap<String, f64> {
        std::mem::take(&mut self.0)
    }
}

/// §4.2 step 1: decay each pressure toward its baseline, then fold in
/// pending deltas from the previous tick and distribution-driven
/// adjustments.
pub fn update_pressures(graph: &mut Graph, config: &EngineConfig, pending: &mut PendingDeltas) {
    for (id, spec) in &config.pressures {
        let current = graph.get_pressure(id);
        let decayed = current + spec.decay * (spec.baseline - current);
        graph.set_pressure(id.clone(), decayed);
    }
    for (id, delta) in pending.take() {
        let current = graph.get_pressure(&id);
        graph.set_pressure(id, current + delta);
    }
}

/// §4.9 distribution-driven adjustment: when an entity-kind deficit
/// exceeds `deficit_threshold`, add a positive delta to every pressure the
/// domain maps to that kind.
pub fn apply_distribution_pressure(
    graph: &Graph,
    config: &EngineConfig,
    mappings: &BTreeMap<Kind, Vec<String>>,
    deficit_threshold: f64,
    delta_per_deficit: f64,
    pending: &mut PendingDeltas,
) {
    for (kind_str, &target) in &config.target_entities_per_kind {
        let Some(kind) = parse_kind(kind_str) else {
            continue;
        };
        if target == 0 {
            continue;
        }
        let actual = graph.get_entities_by_kind(kind).len();
        let deficit = (target.saturating_sub(actual)) as f64 / target as f64;
        if deficit > deficit_threshold {
            if let Some(pressure_ids) = mappings.get(&kind) {
                for pid in pressure_ids {
                    pending.add_one(pid.clone(), delta_per_deficit * deficit);
                }
            }
        }
    }
}

fn parse_kind(s: &str) -> Option<Kind> {
    Kind::all().into_iter().find(|k| k.to_string() == s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_pulls_toward_baseline() {
        let mut graph = Graph::new();
        graph.set_pressure("conflict", 90.0);
        let mut cfg_pressures = BTreeMap::new();
        cfg_pressures.insert(
            "conflict".to_string(),
            worldhist_config::PressureSpec {
                baseline: 10.0,
                decay: 0.5,
            },
        );
        let config = test_config(cfg_pressures);
        let mut pending = PendingDeltas::new();
        update_pressures(&mut graph, &config, &mut pending);
        assert_eq!(graph.get_pressure("conflict"), 50.0);
    }

    #[test]
    fn pending_deltas_apply_and_clear() {
        let mut graph = Graph::new();
        let config = test_config(BTreeMap::new());
        let mut pending = PendingDeltas::new();
        pending.add_one("settlement", 20.0);
        update_pressures(&mut graph, &config, &mut pending);
        assert_eq!(graph.get_pressure("settlement"), 20.0);
        // second call with no new deltas leaves it unchanged (cleared after take)
        update_pressures(&mut graph, &config, &mut pending);
        assert_eq!(graph.get_pressure("settlement"), 20.0);
    }

    fn test_config(pressures: BTreeMap<String, worldhist_config::PressureSpec>) -> EngineConfig {
        EngineConfig {
            epoch_length: 10,
            simulation_ticks_per_growth: 5,
            max_ticks: 100,
            target_entities_per_kind: BTreeMap::new(),
            relationship_budget: worldhist_config::RelationshipBudget {
                max_per_simulation_tick: 10,
                max_per_growth_phase: 30,
            },
            pressures,
            eras: vec![],
            action_domains: vec![],
            distribution_targets: None,
            emergent_discovery: Default::default(),
            hard_cap: 1000,
            deficit_alpha: 2.0,
            max_runs_per_template: 50,
            growth_metrics_window: 10,
            seed: 1,
        }
    }
}
