//! Era lifecycle (§4.6): `eraSpawner` lazily creates the first era;
//! `eraTransition` advances the current era once its gating conditions
//! hold.

use worldhist_config::{Comparator, EngineConfig, EraConfig, OccurrenceTest, TransitionCondition};
use worldhist_core::{Kind, Result, Status};
use worldhist_graph::{EntityPatch, EntitySettings, EventKind, HardState, Temporal, View};

use crate::system::{EnrichmentHint, System, SystemMeta, SystemResult};

fn era_entity_settings(era: &EraConfig, status: Status, start_tick: u64) -> EntitySettings {
    EntitySettings::new(Kind::Era, era.id.clone(), era.name.clone())
        .description(era.description.clone())
        .status(status)
        .temporal(Temporal {
            start_tick,
            end_tick: None,
        })
}

/// `eraSpawner` (§4.5): once, spawns the first era entity, sets it
/// `current`, sets `graph.currentEra`.
pub struct EraSpawner {
    meta: SystemMeta,
}

impl EraSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: SystemMeta {
                id: "eraSpawner".to_string(),
                base_weight: 1.0,
            },
        }
    }
}

impl Default for EraSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EraSpawner {
    fn meta(&self) -> &SystemMeta {
        &self.meta
    }

    fn apply(&self, view: &mut View<'_, EngineConfig>, _modifier: f64) -> Result<SystemResult> {
        if !view.get_entities_by_kind(Kind::Era).is_empty() {
            return Ok(SystemResult::empty());
        }
        let Some(first) = view.config().first_era().cloned() else {
            return Ok(SystemResult::empty());
        };
        let tick = view.tick();
        let id = view.create_entity(era_entity_settings(&first, Status::Current, tick))?;
        view.set_current_era(id);
        view.add_history_event(
            EventKind::Special,
            format!("The age of {} begins.", first.name),
        );
        Ok(SystemResult {
            entities_touched: 1,
            relationships_touched: 0,
            note: Some(format!("spawned era {}", first.id)),
            enrichment: None,
        })
    }
}

fn current_era(view: &View<'_, EngineConfig>) -> Option<HardState> {
    view.get_entities_by_kind(Kind::Era)
        .into_iter()
        .find(|e| e.status == Status::Current)
}

fn condition_holds(condition: &TransitionCondition, view: &View<'_, EngineConfig>) -> bool {
    match condition {
        TransitionCondition::Pressure {
            pressure_id,
            operator,
            threshold,
        } => operator.holds(view.get_pressure(pressure_id), *threshold),
        TransitionCondition::EntityCount {
            entity_kind,
            subtype,
            status,
            operator,
            threshold,
        } => {
            let Some(kind) = Kind::all().into_iter().find(|k| k.to_string() == *entity_kind) else {
                return false;
            };
            let count = view
                .get_entities_by_kind(kind)
                .into_iter()
                .filter(|e| subtype.as_deref().map_or(true, |s| s == e.subtype))
                .filter(|e| {
                    status
                        .as_deref()
                        .map_or(true, |s| format!("{:?}", e.status).to_lowercase() == s.to_lowercase())
                })
                .count();
            operator.holds(count as f64, *threshold)
        }
        TransitionCondition::Occurrence { subtype, operator } => {
            let matches: Vec<HardState> = view
                .get_entities_by_kind(Kind::Occurrence)
                .into_iter()
                .filter(|e| e.subtype == *subtype)
                .collect();
            match operator {
                OccurrenceTest::Exists => !matches.is_empty(),
                OccurrenceTest::Ended => matches
                    .iter()
                    .any(|e| e.temporal.is_some_and(|t| t.end_tick.is_some())),
            }
        }
        TransitionCondition::Time { min_ticks } => {
            current_era(view).is_some_and(|era| {
                era.temporal
                    .is_some_and(|t| view.tick().saturating_sub(t.start_tick) >= *min_ticks)
            })
        }
    }
}

fn transition_ready(era_config: &EraConfig, era_age: u64, view: &View<'_, EngineConfig>) -> bool {
    match &era_config.transition_conditions {
        None => era_age > 2 * era_config.min_era_length,
        Some(conditions) => conditions.iter().all(|c| condition_holds(c, view)),
    }
}

/// `eraTransition` (§4.5, §4.6).
pub struct EraTransition {
    meta: SystemMeta,
}

impl EraTransition {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: SystemMeta {
                id: "eraTransition".to_string(),
                base_weight: 1.0,
            },
        }
    }
}

impl Default for EraTransition {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EraTransition {
    fn meta(&self) -> &SystemMeta {
        &self.meta
    }

    fn apply(&self, view: &mut View<'_, EngineConfig>, _modifier: f64) -> Result<SystemResult> {
        let Some(current) = current_era(view) else {
            // eraSpawner runs earlier in registration order; if it hasn't
            // fired yet this tick there's nothing to transition.
            return Ok(SystemResult::empty());
        };
        let Some(era_config) = view.config().era(&current.subtype).cloned() else {
            return Ok(SystemResult::empty());
        };
        let start_tick = current.temporal.map_or(0, |t| t.start_tick);
        let era_age = view.tick().saturating_sub(start_tick);

        if era_age < era_config.min_era_length {
            return Ok(SystemResult::empty());
        }
        // Additive reading of step 3 (SPEC_FULL §4.6 resolution): cooldown
        // runs after min_era_length, not instead of it. Do not "simplify"
        // this back to `era_age < era_config.transition_cooldown`.
        if era_age < era_config.min_era_length + era_config.transition_cooldown {
            return Ok(SystemResult::empty());
        }
        if !transition_ready(&era_config, era_age, view) {
            return Ok(SystemResult::empty());
        }

        let Some(next_config) = view.config().era_after(&era_config.id).cloned() else {
            // Final era: never ends during the run.
            return Ok(SystemResult::empty());
        };

        let tick = view.tick();
        view.update_entity(
            current.id,
            EntityPatch::new().with_status(Status::Historical).with_temporal(Temporal {
                start_tick,
                end_tick: Some(tick),
            }),
        )?;

        let next_id = if let Some(existing) = view
            .get_entities_by_kind(Kind::Era)
            .into_iter()
            .find(|e| e.subtype == next_config.id)
        {
            view.update_entity(
                existing.id,
                EntityPatch::new().with_status(Status::Current),
            )?;
            existing.id
        } else {
            view.create_entity(era_entity_settings(&next_config, Status::Current, tick))?
        };
        view.set_current_era(next_id);

        let prominent_entities: Vec<HardState> = view
            .find_entities(&worldhist_graph::EntityCriteria::new())
            .into_iter()
            .filter(|e| {
                e.kind != Kind::Era
                    && e.prominence.is_prominent()
                    && e.created_at >= start_tick
            })
            .take(10)
            .collect();
        let mut relationships_touched = 0;
        for entity in &prominent_entities {
            if view.add_relationship("active_during", entity.id, current.id, None) {
                relationships_touched += 1;
            }
        }

        for (pressure_id, delta) in &era_config.transition_effects.pressure_changes {
            let updated = view.get_pressure(pressure_id) + delta;
            view.set_pressure(pressure_id.clone(), updated);
        }
        for (pressure_id, delta) in &next_config.entry_effects.pressure_changes {
            let updated = view.get_pressure(pressure_id) + delta;
            view.set_pressure(pressure_id.clone(), updated);
        }

        view.add_history_event(
            EventKind::Special,
            format!("The {} ends. The {} begins.", era_config.name, next_config.name),
        );

        Ok(SystemResult {
            entities_touched: prominent_entities.len() + 2,
            relationships_touched,
            note: Some(format!("{} -> {}", era_config.id, next_config.id)),
            enrichment: Some(EnrichmentHint::EraNarrative(next_id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_holds_matches_operator() {
        assert!(Comparator::Above.holds(10.0, 5.0));
        assert!(!Comparator::Above.holds(3.0, 5.0));
        assert!(Comparator::Below.holds(3.0, 5.0));
    }
}
