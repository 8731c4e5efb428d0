//! Template selector (§4.3): weighted scoring, deficit boost, diversity
//! dampening, and weighted sampling over registered growth templates.

use std::collections::BTreeMap;

use worldhist_config::EngineConfig;
use worldhist_core::{Kind, Rng};

use crate::template::TemplateMeta;

/// Per-run bookkeeping the selector needs across ticks: how many times each
/// template has fired (diversity dampening) and the era's template weight
/// overrides, both keyed by template id.
#[derive(Debug, Default, Clone)]
pub struct SelectorState {
    run_counts: BTreeMap<String, u32>,
}

impl SelectorState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn run_count(&self, template_id: &str) -> u32 {
        self.run_counts.get(template_id).copied().unwrap_or(0)
    }

    pub fn record_run(&mut self, template_id: &str) {
        *self.run_counts.entry(template_id.to_string()).or_insert(0) += 1;
    }
}

/// One scored candidate, kept around for the `actionApplication`-style
/// observability records (§4.7 inspires the same shape here).
#[derive(Debug, Clone)]
pub struct ScoredTemplate {
    pub id: String,
    pub weight: f64,
}

/// `pressureBoost(T) = 1 + Σ_p (pressure[p]/100 × T.pressureModifiers[p])`,
/// clamped to a floor of 0.1.
#[must_use]
pub fn pressure_boost(pressures: &BTreeMap<String, f64>, modifiers: &BTreeMap<String, f64>) -> f64 {
    let sum: f64 = modifiers
        .iter()
        .map(|(id, mult)| pressures.get(id).copied().unwrap_or(0.0) / 100.0 * mult)
        .sum();
    (1.0 + sum).max(0.1)
}

/// `deficitBoost(T) = 1 + α · Σ max(0, (target-actual)/target)` over every
/// kind this template produces. Templates in this engine each produce a
/// single kind (`TemplateMeta::produces_kind`), so the sum degenerates to
/// one term, but the formula is written generally in case a future
/// template is registered with a composite manifest.
#[must_use]
pub fn deficit_boost(
    produced_kinds: &[Kind],
    target_entities_per_kind: &BTreeMap<String, usize>,
    actual_counts: &BTreeMap<Kind, usize>,
    alpha: f64,
) -> f64 {
    let deficit_sum: f64 = produced_kinds
        .iter()
        .map(|kind| {
            let target = target_entities_per_kind
                .get(&kind.to_string())
                .copied()
                .unwrap_or(0);
            if target == 0 {
                return 0.0;
            }
            let actual = actual_counts.get(kind).copied().unwrap_or(0);
            (target.saturating_sub(actual)) as f64 / target as f64
        })
        .sum();
    1.0 + alpha * deficit_sum
}

/// `diversityPenalty(T) = max(0.1, 1 - runCount[T] / maxRunsPerTemplate)`.
#[must_use]
pub fn diversity_penalty(run_count: u32, max_runs_per_template: u32) -> f64 {
    if max_runs_per_template == 0 {
        return 0.1;
    }
    (1.0 - f64::from(run_count) / f64::from(max_runs_per_template)).max(0.1)
}

/// Computes the full §4.3 weight for one template.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn score_template(
    meta: &TemplateMeta,
    era_template_weight: f64,
    pressures: &BTreeMap<String, f64>,
    template_pressure_modifiers: &BTreeMap<String, f64>,
    target_entities_per_kind: &BTreeMap<String, usize>,
    actual_counts: &BTreeMap<Kind, usize>,
    run_count: u32,
    config: &EngineConfig,
) -> f64 {
    meta.base_weight
        * era_template_weight
        * pressure_boost(pressures, template_pressure_modifiers)
        * deficit_boost(
            &[meta.produces_kind],
            target_entities_per_kind,
            actual_counts,
            config.deficit_alpha,
        )
        * diversity_penalty(run_count, config.max_runs_per_template)
}

/// Weighted-with-replacement sampling of `count` templates from `scored`,
/// ties on equal weight broken deterministically by template id ordering
/// (§4.3). Returns ids in pick order; an empty `scored` yields no picks,
/// matching "if no template passes `canApply`, the phase yields zero
/// entities (not an error)".
pub fn sample_templates(scored: &[ScoredTemplate], count: usize, rng: &mut Rng) -> Vec<String> {
    if scored.is_empty() || count == 0 {
        return Vec::new();
    }
    let mut ordered: Vec<&ScoredTemplate> = scored.iter().collect();
    ordered.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    let pairs: Vec<(String, f64)> = ordered.iter().map(|s| (s.id.clone(), s.weight)).collect();
    let mut picks = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(chosen) = rng.weighted_choice(&pairs) else {
            break;
        };
        picks.push(chosen.clone());
    }
    picks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_boost_floors_at_point_one() {
        let mut pressures = BTreeMap::new();
        pressures.insert("conflict".to_string(), 100.0);
        let mut modifiers = BTreeMap::new();
        modifiers.insert("conflict".to_string(), -5.0);
        assert_eq!(pressure_boost(&pressures, &modifiers), 0.1);
    }

    #[test]
    fn deficit_boost_scales_with_alpha() {
        let mut targets = BTreeMap::new();
        targets.insert("npc".to_string(), 100);
        let mut actual = BTreeMap::new();
        actual.insert(Kind::Npc, 50);
        let boost = deficit_boost(&[Kind::Npc], &targets, &actual, 2.0);
        assert!((boost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn diversity_penalty_never_reaches_zero() {
        assert_eq!(diversity_penalty(1000, 50), 0.1);
    }

    #[test]
    fn sampling_is_empty_when_no_templates_pass() {
        let mut rng = Rng::seeded(1);
        assert!(sample_templates(&[], 3, &mut rng).is_empty());
    }

    #[test]
    fn higher_pressure_modifier_increases_selection_frequency() {
        // Scenario 2 from §8: foundColony with pressureModifiers={settlement: 2.0}
        // should be selected >= 2x as often at pressure 80 vs pressure 0.
        let meta_colony = TemplateMeta {
            id: "foundColony".to_string(),
            produces_kind: Kind::Location,
            base_weight: 1.0,
            pressure_modifiers: BTreeMap::new(),
        };
        let meta_other = TemplateMeta {
            id: "other".to_string(),
            produces_kind: Kind::Npc,
            base_weight: 1.0,
            pressure_modifiers: BTreeMap::new(),
        };
        let mut modifiers = BTreeMap::new();
        modifiers.insert("settlement".to_string(), 2.0);

        let count_picks = |pressure_value: f64| -> usize {
            let mut pressures = BTreeMap::new();
            pressures.insert("settlement".to_string(), pressure_value);
            let boost_colony = pressure_boost(&pressures, &modifiers);
            let boost_other = pressure_boost(&pressures, &BTreeMap::new());
            let scored = vec![
                ScoredTemplate {
                    id: meta_colony.id.clone(),
                    weight: meta_colony.base_weight * boost_colony,
                },
                ScoredTemplate {
                    id: meta_other.id.clone(),
                    weight: meta_other.base_weight * boost_other,
                },
            ];
            let mut rng = Rng::seeded(42);
            let mut hits = 0;
            for _ in 0..10_000 {
                if sample_templates(&scored, 1, &mut rng).first() == Some(&"foundColony".to_string())
                {
                    hits += 1;
                }
            }
            hits
        };

        let low = count_picks(0.0).max(1);
        let high = count_picks(80.0);
        assert!(
            high as f64 >= 2.0 * low as f64,
            "high={high} low={low} should show >=2x selection frequency"
        );
    }
}
