//! Relationship culling (§4.8): budget-driven archival of the weakest
//! non-protected active relationships. Not sampled by the system selector —
//! runs unconditionally at end of tick whenever a budget is exceeded.

use worldhist_config::EngineConfig;
use worldhist_graph::{is_protected, EventKind, Relationship, View};

/// Weights for the weakness formula `w1(1-strength) + w2 ageDecay +
/// w3 endpointDegree - w4 recentnessBonus` (§4.8). Exposed as config so a
/// domain can retune emphasis without forking the engine.
#[derive(Debug, Clone, Copy)]
pub struct CullingWeights {
    pub strength: f64,
    pub age: f64,
    pub degree: f64,
    pub recentness: f64,
}

impl Default for CullingWeights {
    fn default() -> Self {
        Self {
            strength: 1.0,
            age: 1.0,
            degree: 0.5,
            recentness: 0.5,
        }
    }
}

fn weakness(
    rel: &Relationship,
    tick: u64,
    endpoint_degree: usize,
    max_degree: usize,
    weights: CullingWeights,
) -> f64 {
    let strength_term = 1.0 - rel.strength;
    let age = tick.saturating_sub(rel.created_at) as f64;
    let age_decay = (age / (age + 50.0)).clamp(0.0, 1.0);
    let degree_term = if max_degree == 0 {
        0.0
    } else {
        endpoint_degree as f64 / max_degree as f64
    };
    let recentness_bonus = if age < 10.0 { 1.0 - age / 10.0 } else { 0.0 };

    weights.strength * strength_term + weights.age * age_decay + weights.degree * degree_term
        - weights.recentness * recentness_bonus
}

/// Culls the weakest non-protected active relationships until
/// `relationships.len() <= budget` or 20% of non-protected relationships
/// have been culled, whichever comes first. Returns the number archived.
/// Emits a single history event with the count when anything was culled.
pub fn cull_to_budget(view: &mut View<'_, EngineConfig>, budget: usize, weights: CullingWeights) -> usize {
    let all = view.find_relationships(&worldhist_graph::RelationshipCriteria::default());
    let active: Vec<&Relationship> = all
        .iter()
        .filter(|r| r.status == worldhist_graph::RelationshipStatus::Active)
        .collect();
    if active.len() <= budget {
        return 0;
    }

    let non_protected: Vec<&Relationship> = active
        .iter()
        .copied()
        .filter(|r| !is_protected(&r.kind))
        .collect();
    if non_protected.is_empty() {
        return 0;
    }

    let mut degree = std::collections::HashMap::new();
    for r in &active {
        *degree.entry(r.src).or_insert(0usize) += 1;
        *degree.entry(r.dst).or_insert(0usize) += 1;
    }
    let max_degree = degree.values().copied().max().unwrap_or(0);
    let tick = view.tick();

    let mut scored: Vec<(f64, &Relationship)> = non_protected
        .iter()
        .map(|r| {
            let endpoint_degree = degree.get(&r.src).copied().unwrap_or(0) + degree.get(&r.dst).copied().unwrap_or(0);
            (weakness(r, tick, endpoint_degree, max_degree * 2, weights), *r)
        })
        .collect();
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let to_cull_for_budget = active.len() - budget;
    let max_allowed_by_ratio = (non_protected.len() as f64 * 0.2).floor() as usize;
    let cull_count = to_cull_for_budget.min(max_allowed_by_ratio).min(scored.len());

    let mut culled = 0;
    for (_, rel) in scored.into_iter().take(cull_count) {
        if view.archive_relationship(rel.src, rel.dst, &rel.kind) {
            culled += 1;
        }
    }
    if culled > 0 {
        view.add_history_event(
            EventKind::Simulation,
            format!("{culled} weak relationships fade into history."),
        );
    }
    culled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weakness_prefers_weaker_older_relationships() {
        let weak = Relationship::new("knows".to_string(), dummy_id(1), dummy_id(2), 0)
            .with_strength(0.1);
        let strong = Relationship::new("knows".to_string(), dummy_id(1), dummy_id(3), 0)
            .with_strength(0.9);
        let w1 = weakness(&weak, 100, 1, 2, CullingWeights::default());
        let w2 = weakness(&strong, 100, 1, 2, CullingWeights::default());
        assert!(w1 > w2, "weaker relationship should score higher weakness");
    }

    fn dummy_id(_seed: u8) -> worldhist_core::EntityId {
        worldhist_core::EntityId::from_uuid(uuid::Uuid::new_v4())
    }
}
