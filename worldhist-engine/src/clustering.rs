//! Clustering & meta-entities (§4.12).
//!
//! Eligible entities (non-historical, not already a meta-entity) are
//! greedily clustered in chronological order by `created_at`. A candidate
//! joins the cluster it scores highest similarity against, provided that
//! score clears `clusterJoinThreshold`; otherwise it seeds a new cluster.
//! Clusters reaching `minSize` are materialized into a container entity
//! tagged `meta-entity`, with members linked to it via `part_of`.

use std::collections::BTreeSet;

use serde_json::Value;
use worldhist_config::EngineConfig;
use worldhist_core::{EntityId, Kind, Status};
use worldhist_graph::{Direction, EntitySettings, HardState, View};

const META_ENTITY_TAG: &str = "meta-entity";

/// One weighted similarity criterion (§4.12). `Custom` lets a domain supply
/// a predicate this module has no other vocabulary for.
pub enum ClusterCriterion {
    SharedRelationship { kind: String, direction: Direction },
    SharedTags { jaccard_threshold: f64 },
    TemporalProximity { max_delta_ticks: u64 },
    SameSubtype,
    SameCulture,
    Custom(Box<dyn Fn(&HardState, &HardState) -> bool + Send + Sync>),
}

impl ClusterCriterion {
    fn holds(&self, view: &View<'_, EngineConfig>, a: &HardState, b: &HardState) -> bool {
        match self {
            Self::SharedRelationship { kind, direction } => view
                .get_entity_relationships(a.id, *direction)
                .iter()
                .any(|r| r.kind == *kind && (r.src == b.id || r.dst == b.id)),
            Self::SharedTags { jaccard_threshold } => {
                jaccard_of_keys(&a.tags.keys().cloned().collect(), &b.tags.keys().cloned().collect())
                    >= *jaccard_threshold
            }
            Self::TemporalProximity { max_delta_ticks } => {
                a.created_at.abs_diff(b.created_at) <= *max_delta_ticks
            }
            Self::SameSubtype => a.subtype == b.subtype,
            Self::SameCulture => !a.culture.is_empty() && a.culture == b.culture,
            Self::Custom(predicate) => predicate(a, b),
        }
    }
}

fn jaccard_of_keys(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

pub struct ClusteringConfig {
    pub criteria: Vec<ClusterCriterion>,
    /// `clusterJoinThreshold`, default 0.7.
    pub join_threshold: f64,
    pub min_size: usize,
    /// Whether members' external relationships (other than `part_of`) are
    /// copied onto the container entity once it's materialized.
    pub lift_relationships: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            criteria: Vec::new(),
            join_threshold: 0.7,
            min_size: 3,
            lift_relationships: false,
        }
    }
}

/// Average-similarity-to-members score a candidate gets against an existing
/// cluster, i.e. "average similarity to members" from §4.12.
fn average_similarity(view: &View<'_, EngineConfig>, criteria: &[ClusterCriterion], candidate: &HardState, cluster: &[HardState]) -> f64 {
    if criteria.is_empty() || cluster.is_empty() {
        return 0.0;
    }
    let scores: Vec<f64> = cluster
        .iter()
        .map(|member| {
            let hits = criteria.iter().filter(|c| c.holds(view, candidate, member)).count();
            hits as f64 / criteria.len() as f64
        })
        .collect();
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn is_eligible(entity: &HardState) -> bool {
    entity.status != Status::Historical && !entity.tags.contains_key(META_ENTITY_TAG)
}

/// Greedy chronological clustering over `candidates` (already filtered to
/// one entity population, e.g. all NPCs, by the caller). Returns each
/// cluster as a list of member `HardState` snapshots, in no particular
/// inter-cluster order.
#[must_use]
pub fn cluster_entities(view: &View<'_, EngineConfig>, candidates: &[HardState], config: &ClusteringConfig) -> Vec<Vec<HardState>> {
    let mut sorted: Vec<&HardState> = candidates.iter().filter(|e| is_eligible(e)).collect();
    sorted.sort_by_key(|e| e.created_at);

    let mut clusters: Vec<Vec<HardState>> = Vec::new();
    for entity in sorted {
        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            let score = average_similarity(view, &config.criteria, entity, cluster);
            let is_better = match best {
                Some((_, best_score)) => score > best_score,
                None => true,
            };
            if is_better {
                best = Some((idx, score));
            }
        }
        match best {
            Some((idx, score)) if score >= config.join_threshold => {
                clusters[idx].push(entity.clone());
            }
            _ => clusters.push(vec![entity.clone()]),
        }
    }
    clusters
}

/// Materializes every cluster at or above `minSize` into a container
/// meta-entity of `container_kind`, linking members via `part_of` and
/// optionally lifting their external relationships onto the container.
/// Returns the ids of newly created containers.
pub fn materialize_clusters(
    view: &mut View<'_, EngineConfig>,
    clusters: Vec<Vec<HardState>>,
    container_kind: Kind,
    container_subtype: &str,
    config: &ClusteringConfig,
) -> worldhist_core::Result<Vec<EntityId>> {
    let mut containers = Vec::new();
    for cluster in clusters {
        if cluster.len() < config.min_size {
            continue;
        }
        let name = format!("{container_subtype} cluster of {}", cluster.len());
        let settings = EntitySettings::new(container_kind, container_subtype, name)
            .description(format!("A meta-entity grouping {} related entities.", cluster.len()))
            .tag(META_ENTITY_TAG, Value::Bool(true));
        let container_id = view.create_entity(settings)?;

        for member in &cluster {
            view.add_relationship("part_of", member.id, container_id, Some(1.0));
            if config.lift_relationships {
                for rel in view.get_entity_relationships(member.id, Direction::Both) {
                    if rel.kind == "part_of" {
                        continue;
                    }
                    let other = if rel.src == member.id { rel.dst } else { rel.src };
                    if other == container_id {
                        continue;
                    }
                    if rel.src == member.id {
                        view.add_relationship(rel.kind.clone(), container_id, other, Some(rel.strength));
                    } else {
                        view.add_relationship(rel.kind.clone(), other, container_id, Some(rel.strength));
                    }
                }
            }
        }
        containers.push(container_id);
    }
    Ok(containers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_of_identical_key_sets_is_one() {
        let a: BTreeSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let b = a.clone();
        assert!((jaccard_of_keys(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn jaccard_of_disjoint_sets_is_zero() {
        let a: BTreeSet<String> = ["x"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["y"].iter().map(|s| s.to_string()).collect();
        assert_eq!(jaccard_of_keys(&a, &b), 0.0);
    }

    #[test]
    fn eligibility_excludes_historical_and_meta_entities() {
        let mut rng = worldhist_core::Rng::seeded(1);

        let mut historical = EntitySettings::new(Kind::Npc, "villager", "A");
        historical.status = Status::Historical;
        assert!(!is_eligible(&to_hard_state(historical, &mut rng)));

        let meta = EntitySettings::new(Kind::Npc, "villager", "B").tag(META_ENTITY_TAG, Value::Bool(true));
        assert!(!is_eligible(&to_hard_state(meta, &mut rng)));

        let plain = EntitySettings::new(Kind::Npc, "villager", "C");
        assert!(is_eligible(&to_hard_state(plain, &mut rng)));
    }

    fn to_hard_state(settings: EntitySettings, rng: &mut worldhist_core::Rng) -> HardState {
        HardState {
            id: crate::name_logger::IdGenerator::new(rng).next_entity_id(),
            kind: settings.kind,
            subtype: settings.subtype,
            name: settings.name,
            description: settings.description,
            status: settings.status,
            prominence: settings.prominence,
            culture: settings.culture,
            tags: settings.tags,
            links: Vec::new(),
            created_at: 0,
            updated_at: 0,
            temporal: settings.temporal,
            coordinates: settings.coordinates,
            catalyst: settings.catalyst,
        }
    }
}
