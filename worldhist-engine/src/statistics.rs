//! Statistics, validation, fitness (§4.11). Connectivity is computed with
//! `petgraph` rather than a hand-rolled traversal, the way the pack's
//! graph-adjacent crates (`aura-analysis-client`, the akh-medu toolchain)
//! lean on it for the same class of computation. [SUPPLEMENT]

use std::collections::BTreeMap;

use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use serde::Serialize;
use worldhist_core::{EntityId, Kind, Prominence};
use worldhist_graph::Graph;

/// Running counters recorded once per epoch (§4.11's "running counters").
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochStats {
    pub entities_by_kind: BTreeMap<Kind, usize>,
    pub entities_by_subtype: BTreeMap<String, usize>,
    pub relationships_by_kind: BTreeMap<String, usize>,
    pub pressures: BTreeMap<String, f64>,
    pub target_vs_actual: BTreeMap<String, (usize, usize)>,
    pub relationship_growth_rate: f64,
}

fn entities_by_kind(graph: &Graph) -> BTreeMap<Kind, usize> {
    let mut counts = BTreeMap::new();
    for kind in Kind::all() {
        counts.insert(kind, graph.get_entities_by_kind(kind).len());
    }
    counts
}

/// Captures one epoch's running counters.
#[must_use]
pub fn record_epoch(graph: &Graph, target_entities_per_kind: &BTreeMap<String, usize>) -> EpochStats {
    let mut entities_by_subtype = BTreeMap::new();
    let mut relationships_by_kind = BTreeMap::new();
    for kind in Kind::all() {
        for entity in graph.get_entities_by_kind(kind) {
            *entities_by_subtype.entry(entity.subtype).or_insert(0) += 1;
        }
    }
    for rel in graph.get_relationships() {
        *relationships_by_kind.entry(rel.kind).or_insert(0) += 1;
    }
    let counts = entities_by_kind(graph);
    let target_vs_actual = target_entities_per_kind
        .iter()
        .map(|(kind_str, target)| {
            let actual = Kind::all()
                .into_iter()
                .find(|k| k.to_string() == *kind_str)
                .map(|k| counts.get(&k).copied().unwrap_or(0))
                .unwrap_or(0);
            (kind_str.clone(), (*target, actual))
        })
        .collect();

    EpochStats {
        entities_by_kind: counts,
        entities_by_subtype,
        relationships_by_kind,
        pressures: graph.pressures().clone(),
        target_vs_actual,
        relationship_growth_rate: graph.growth_metrics.average_growth_rate(),
    }
}

/// Entity-kind / prominence distributions: ratio actually present vs.
/// `targetEntitiesPerKind`, and a deviation score (mean absolute
/// difference between actual and target ratios).
#[must_use]
pub fn kind_distribution_deviation(graph: &Graph, target_entities_per_kind: &BTreeMap<String, usize>) -> f64 {
    if target_entities_per_kind.is_empty() {
        return 0.0;
    }
    let total_target: usize = target_entities_per_kind.values().sum();
    if total_target == 0 {
        return 0.0;
    }
    let total_actual = graph.entity_count().max(1);
    let mut sum_abs_dev = 0.0;
    for (kind_str, target) in target_entities_per_kind {
        let Some(kind) = Kind::all().into_iter().find(|k| k.to_string() == *kind_str) else {
            continue;
        };
        let actual = graph.get_entities_by_kind(kind).len();
        let target_ratio = *target as f64 / total_target as f64;
        let actual_ratio = actual as f64 / total_actual as f64;
        sum_abs_dev += (target_ratio - actual_ratio).abs();
    }
    sum_abs_dev / target_entities_per_kind.len() as f64
}

/// Relationship diversity via normalized Shannon entropy (evenness) over
/// relationship kinds.
#[must_use]
pub fn relationship_diversity(graph: &Graph) -> f64 {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for rel in graph.get_relationships() {
        *counts.entry(rel.kind).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();
    if total == 0 || counts.len() <= 1 {
        return if counts.len() == 1 { 0.0 } else { 1.0 };
    }
    let entropy: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.ln()
        })
        .sum();
    let max_entropy = (counts.len() as f64).ln();
    if max_entropy <= 0.0 {
        0.0
    } else {
        entropy / max_entropy
    }
}

/// Connectivity: connected components, isolated-entity ratio, average
/// degree, computed over an undirected projection of active relationships
/// via `petgraph`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connectivity {
    pub connected_components: usize,
    pub isolated_ratio: f64,
    pub average_degree: f64,
}

#[must_use]
pub fn connectivity(graph: &Graph) -> Connectivity {
    let entities: Vec<EntityId> = Kind::all()
        .into_iter()
        .flat_map(|k| graph.get_entities_by_kind(k))
        .map(|e| e.id)
        .collect();
    if entities.is_empty() {
        return Connectivity::default();
    }
    let mut pg = UnGraph::<EntityId, ()>::new_undirected();
    let mut index = BTreeMap::new();
    for id in &entities {
        index.insert(*id, pg.add_node(*id));
    }
    for rel in graph.get_relationships() {
        if let (Some(&src), Some(&dst)) = (index.get(&rel.src), index.get(&rel.dst)) {
            pg.add_edge(src, dst, ());
        }
    }
    let components = connected_components(&pg);
    let isolated = entities
        .iter()
        .filter(|id| {
            index
                .get(id)
                .is_some_and(|&ix| pg.neighbors(ix).next().is_none())
        })
        .count();
    let total_degree: usize = entities
        .iter()
        .filter_map(|id| index.get(id))
        .map(|&ix| pg.neighbors(ix).count())
        .sum();

    Connectivity {
        connected_components: components,
        isolated_ratio: isolated as f64 / entities.len() as f64,
        average_degree: total_degree as f64 / entities.len() as f64,
    }
}

/// Weighted fitness combining distribution, diversity, and connectivity
/// fitness into `[0, 1]`, plus a constraint violation count and a
/// stability score derived from growth-rate variance.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fitness {
    pub distribution_fitness: f64,
    pub diversity_fitness: f64,
    pub connectivity_fitness: f64,
    pub overall: f64,
    pub constraint_violations: usize,
    pub stability_score: f64,
}

#[must_use]
pub fn fitness(graph: &Graph, target_entities_per_kind: &BTreeMap<String, usize>, violations: usize) -> Fitness {
    let distribution_fitness = 1.0 - kind_distribution_deviation(graph, target_entities_per_kind).min(1.0);
    let diversity_fitness = relationship_diversity(graph);
    let conn = connectivity(graph);
    let connectivity_fitness = (1.0 - conn.isolated_ratio).max(0.0);
    let overall = (distribution_fitness + diversity_fitness + connectivity_fitness) / 3.0;
    let stability_score = 1.0 / (1.0 + graph.growth_metrics.growth_variance());

    Fitness {
        distribution_fitness,
        diversity_fitness,
        connectivity_fitness,
        overall,
        constraint_violations: violations,
        stability_score,
    }
}

/// End-of-generation validators (§4.11): (1) no isolated entities, (2)
/// domain-required relationships present, (3) all relationship endpoints
/// exist, (4) `links[]` consistent, (5) LLM-enriched entities have at
/// least one lore record. (5) is supplied by the caller since it depends
/// on the lore-record list the engine holds, not the graph.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub failures: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

#[must_use]
pub fn validate_graph(graph: &Graph, required_relationship_kinds_by_kind: &BTreeMap<Kind, Vec<String>>) -> ValidationReport {
    let mut failures = Vec::new();

    let conn = connectivity(graph);
    if conn.isolated_ratio > 0.0 && graph.entity_count() > 1 {
        failures.push(format!(
            "{} isolated entities ({:.1}% of the graph)",
            (conn.isolated_ratio * graph.entity_count() as f64).round(),
            conn.isolated_ratio * 100.0
        ));
    }

    for (kind, required_kinds) in required_relationship_kinds_by_kind {
        for entity in graph.get_entities_by_kind(*kind) {
            let has_any = required_kinds
                .iter()
                .any(|rk| entity.links.iter().any(|l| &l.kind == rk));
            if !has_any && !required_kinds.is_empty() {
                failures.push(format!("{} {} missing a required relationship", kind, entity.id));
            }
        }
    }

    if !graph.check_relationship_endpoints_live() {
        failures.push("relationship endpoint missing a live entity".to_string());
    }
    if !graph.check_links_consistent() {
        failures.push("entity.links inconsistent with relationship list".to_string());
    }

    ValidationReport { failures }
}

/// Whether `prominence` sits above the enrichment-eligibility gate used by
/// change detection (mirrors `Prominence::is_prominent`, used here for the
/// "post-tick-0 enrichable entities" validator).
#[must_use]
pub fn is_enrichable(prominence: Prominence) -> bool {
    prominence.is_prominent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldhist_core::Status;
    use worldhist_graph::EntitySettings;

    #[test]
    fn diversity_is_zero_for_single_kind() {
        let mut g = Graph::new();
        let a = g.create_entity(EntitySettings::new(Kind::Npc, "x", "a")).unwrap();
        let b = g.create_entity(EntitySettings::new(Kind::Npc, "x", "b")).unwrap();
        g.add_relationship("knows", a, b, None, None, None);
        assert_eq!(relationship_diversity(&g), 0.0);
    }

    #[test]
    fn isolated_entity_inflates_validation_failures() {
        let mut g = Graph::new();
        g.create_entity(EntitySettings::new(Kind::Npc, "x", "lonely").status(Status::Active))
            .unwrap();
        let report = validate_graph(&g, &BTreeMap::new());
        assert!(!report.is_valid());
    }
}
