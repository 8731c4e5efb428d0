//! Change detection (§4.10): per-entity snapshots compared tick over tick,
//! producing human-readable change strings when thresholds are crossed.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde_json::Value;
use worldhist_core::{EntityId, Kind, Prominence, Status};
use worldhist_graph::{Direction, HardState, View};

/// Kind-specialized fields captured alongside the common ones (§4.10).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KindFields {
    #[default]
    None,
    Location {
        resident_count: i64,
        controller_id: Option<EntityId>,
    },
    Faction {
        leader_id: Option<EntityId>,
        territory_count: i64,
        ally_ids: Vec<EntityId>,
        enemy_ids: Vec<EntityId>,
    },
    Rules {
        enforcer_ids: Vec<EntityId>,
    },
    Abilities {
        practitioner_count: i64,
        location_ids: Vec<EntityId>,
    },
    Npc {
        leadership_ids: Vec<EntityId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub status: Status,
    pub prominence: Prominence,
    pub relationship_hash: u64,
    pub kind_fields: KindFields,
}

fn tag_int(entity: &HardState, key: &str) -> i64 {
    entity
        .tags
        .get(key)
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

fn tag_ids(entity: &HardState, key: &str) -> Vec<EntityId> {
    entity
        .tags
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .filter_map(|s| s.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

fn tag_id(entity: &HardState, key: &str) -> Option<EntityId> {
    entity.tags.get(key).and_then(Value::as_str).and_then(|s| s.parse().ok())
}

fn relationship_hash(view: &View<'_, worldhist_config::EngineConfig>, id: EntityId) -> u64 {
    let mut keys: Vec<String> = view
        .get_entity_relationships(id, Direction::Both)
        .iter()
        .map(worldhist_graph::Relationship::key_tuple)
        .collect();
    keys.sort();
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    keys.hash(&mut hasher);
    hasher.finish()
}

/// Builds a kind-specialized snapshot for `entity` (§4.10). Kind-specific
/// fields are read from the entity's domain-populated tags, since the
/// engine's `HardState` itself carries only the framework-level fields.
#[must_use]
pub fn snapshot_entity(view: &View<'_, worldhist_config::EngineConfig>, entity: &HardState) -> EntitySnapshot {
    let kind_fields = match entity.kind {
        Kind::Location => KindFields::Location {
            resident_count: tag_int(entity, "residentCount"),
            controller_id: tag_id(entity, "controllerId"),
        },
        Kind::Faction => KindFields::Faction {
            leader_id: tag_id(entity, "leaderId"),
            territory_count: tag_int(entity, "territoryCount"),
            ally_ids: tag_ids(entity, "allyIds"),
            enemy_ids: tag_ids(entity, "enemyIds"),
        },
        Kind::Rules => KindFields::Rules {
            enforcer_ids: tag_ids(entity, "enforcerIds"),
        },
        Kind::Abilities => KindFields::Abilities {
            practitioner_count: tag_int(entity, "practitionerCount"),
            location_ids: tag_ids(entity, "locationIds"),
        },
        Kind::Npc => KindFields::Npc {
            leadership_ids: tag_ids(entity, "leadershipIds"),
        },
        Kind::Era | Kind::Occurrence => KindFields::None,
    };
    EntitySnapshot {
        status: entity.status,
        prominence: entity.prominence,
        relationship_hash: relationship_hash(view, entity.id),
        kind_fields,
    }
}

/// Diffs `previous` against `current`, producing human-readable change
/// strings when a threshold is crossed. Returns an empty vec when nothing
/// qualifies.
#[must_use]
pub fn diff_snapshots(previous: &EntitySnapshot, current: &EntitySnapshot) -> Vec<String> {
    let mut changes = Vec::new();
    if previous.status != current.status {
        changes.push(format!("status changed {:?} -> {:?}", previous.status, current.status));
    }
    if previous.prominence != current.prominence {
        changes.push(format!(
            "prominence changed {:?} -> {:?}",
            previous.prominence, current.prominence
        ));
    }
    if previous.relationship_hash != current.relationship_hash {
        changes.push("relationships changed".to_string());
    }
    match (&previous.kind_fields, &current.kind_fields) {
        (
            KindFields::Location {
                resident_count: prev_count,
                controller_id: prev_controller,
            },
            KindFields::Location {
                resident_count: cur_count,
                controller_id: cur_controller,
            },
        ) => {
            if (cur_count - prev_count).abs() >= 3 {
                changes.push(format!("residents changed by {}", cur_count - prev_count));
            }
            if prev_controller != cur_controller {
                changes.push("controller changed".to_string());
            }
        }
        (
            KindFields::Faction {
                leader_id: prev_leader,
                territory_count: prev_territory,
                ally_ids: prev_allies,
                enemy_ids: prev_enemies,
            },
            KindFields::Faction {
                leader_id: cur_leader,
                territory_count: cur_territory,
                ally_ids: cur_allies,
                enemy_ids: cur_enemies,
            },
        ) => {
            if prev_leader != cur_leader {
                changes.push("leader changed".to_string());
            }
            if prev_territory != cur_territory {
                changes.push(format!("territory changed by {}", cur_territory - prev_territory));
            }
            if id_set_changed(prev_allies, cur_allies) {
                changes.push("allies changed".to_string());
            }
            if id_set_changed(prev_enemies, cur_enemies) {
                changes.push("enemies changed".to_string());
            }
        }
        (KindFields::Rules { enforcer_ids: prev }, KindFields::Rules { enforcer_ids: cur }) => {
            if id_set_changed(prev, cur) {
                changes.push("enforcers changed".to_string());
            }
        }
        (
            KindFields::Abilities {
                practitioner_count: prev_count,
                location_ids: prev_locations,
            },
            KindFields::Abilities {
                practitioner_count: cur_count,
                location_ids: cur_locations,
            },
        ) => {
            if (cur_count - prev_count).abs() >= 3 {
                changes.push(format!("practitioners changed by {}", cur_count - prev_count));
            }
            if id_set_changed(prev_locations, cur_locations) {
                changes.push("practiced locations changed".to_string());
            }
        }
        (KindFields::Npc { leadership_ids: prev }, KindFields::Npc { leadership_ids: cur }) => {
            if id_set_changed(prev, cur) {
                changes.push("leadership roles changed".to_string());
            }
        }
        _ => {}
    }
    changes
}

/// Order-insensitive comparison for the `Vec<EntityId>` kind fields: these
/// are read back from a tag array each tick (§4.10's `tag_ids`), which does
/// not guarantee stable ordering the way a relationship list would.
fn id_set_changed(previous: &[EntityId], current: &[EntityId]) -> bool {
    let prev: std::collections::BTreeSet<_> = previous.iter().collect();
    let cur: std::collections::BTreeSet<_> = current.iter().collect();
    prev != cur
}

/// Whether `entity` qualifies for enrichment this tick: above the
/// prominence gate, or carrying at least one qualifying change (§4.10).
#[must_use]
pub fn should_enqueue(entity: &HardState, changes: &[String]) -> bool {
    entity.prominence.is_prominent() || !changes.is_empty()
}

/// Tracks the last snapshot per entity, across ticks.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    previous: BTreeMap<EntityId, EntitySnapshot>,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots `entity`, diffs against the stored previous snapshot (if
    /// any), stores the new snapshot, and returns the change strings.
    pub fn observe(
        &mut self,
        view: &View<'_, worldhist_config::EngineConfig>,
        entity: &HardState,
    ) -> Vec<String> {
        let current = snapshot_entity(view, entity);
        let changes = self
            .previous
            .get(&entity.id)
            .map(|prev| diff_snapshots(prev, &current))
            .unwrap_or_default();
        self.previous.insert(entity.id, current);
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resident_delta_below_threshold_is_silent() {
        let a = EntitySnapshot {
            status: Status::Active,
            prominence: Prominence::Marginal,
            relationship_hash: 1,
            kind_fields: KindFields::Location {
                resident_count: 10,
                controller_id: None,
            },
        };
        let b = EntitySnapshot {
            kind_fields: KindFields::Location {
                resident_count: 11,
                controller_id: None,
            },
            ..a.clone()
        };
        assert!(diff_snapshots(&a, &b).is_empty());
    }

    #[test]
    fn resident_delta_at_threshold_is_reported() {
        let a = EntitySnapshot {
            status: Status::Active,
            prominence: Prominence::Marginal,
            relationship_hash: 1,
            kind_fields: KindFields::Location {
                resident_count: 10,
                controller_id: None,
            },
        };
        let b = EntitySnapshot {
            kind_fields: KindFields::Location {
                resident_count: 13,
                controller_id: None,
            },
            ..a.clone()
        };
        assert_eq!(diff_snapshots(&a, &b).len(), 1);
    }

    #[test]
    fn prominent_entity_always_enqueues() {
        use worldhist_core::Kind;
        use worldhist_graph::EntitySettings;
        let settings = EntitySettings::new(Kind::Npc, "hero", "Rema").prominence(Prominence::Mythic);
        let entity = HardState {
            id: EntityId::from_uuid(uuid::Uuid::new_v4()),
            kind: settings.kind,
            subtype: settings.subtype,
            name: settings.name,
            description: settings.description,
            status: settings.status,
            prominence: settings.prominence,
            culture: settings.culture,
            tags: settings.tags,
            links: vec![],
            created_at: 0,
            updated_at: 0,
            temporal: None,
            coordinates: None,
            catalyst: None,
        };
        assert!(should_enqueue(&entity, &[]));
    }
}
