//! `occurrenceCreation` (§4.5): instantiates occurrence entities when
//! domain-defined creation conditions hold. The conditions themselves are
//! domain-specific (thresholds on pressures, relationship counts, ...), so
//! this module only provides the registry and the system that drives it.

use std::cell::RefCell;
use std::collections::BTreeMap;

use worldhist_config::EngineConfig;
use worldhist_core::{Kind, Result};
use worldhist_graph::{EntitySettings, EventKind, Temporal, View};

use crate::system::{System, SystemMeta, SystemResult};

/// A domain-defined trigger: `condition` gates whether the occurrence
/// should fire this tick, `build` produces the settings for the new
/// entity. Cooldown prevents the same trigger from firing every tick once
/// its condition stays true.
pub struct OccurrenceTrigger {
    pub subtype: String,
    pub cooldown_ticks: u64,
    pub condition: Box<dyn Fn(&View<'_, EngineConfig>) -> bool + Send + Sync>,
    pub build: Box<dyn Fn(&View<'_, EngineConfig>) -> EntitySettings + Send + Sync>,
}

#[derive(Default)]
pub struct OccurrenceRegistry {
    triggers: Vec<OccurrenceTrigger>,
    /// Interior mutability: `System::apply` takes `&self` (§4.5's
    /// `apply(view, modifier)` contract has no mutable-self channel), so
    /// per-trigger cooldown bookkeeping has to live behind a `RefCell`.
    last_fired: RefCell<BTreeMap<String, u64>>,
}

impl OccurrenceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, trigger: OccurrenceTrigger) {
        self.triggers.push(trigger);
    }
}

/// The `occurrenceCreation` system. Holds the registry directly since
/// occurrence triggers, unlike catalyst action handlers, are not selected
/// per-agent — the system just scans every registered trigger each tick.
pub struct OccurrenceCreation {
    meta: SystemMeta,
    registry: OccurrenceRegistry,
}

impl OccurrenceCreation {
    #[must_use]
    pub fn new(registry: OccurrenceRegistry) -> Self {
        Self {
            meta: SystemMeta {
                id: "occurrenceCreation".to_string(),
                base_weight: 1.0,
            },
            registry,
        }
    }
}

impl System for OccurrenceCreation {
    fn meta(&self) -> &SystemMeta {
        &self.meta
    }

    fn apply(&self, view: &mut View<'_, EngineConfig>, _modifier: f64) -> Result<SystemResult> {
        let tick = view.tick();
        let mut created = 0;
        let mut fired_subtypes = Vec::new();
        for trigger in &self.registry.triggers {
            let last = self.registry.last_fired.borrow().get(&trigger.subtype).copied();
            if let Some(last_tick) = last {
                if tick.saturating_sub(last_tick) < trigger.cooldown_ticks {
                    continue;
                }
            }
            if !(trigger.condition)(view) {
                continue;
            }
            let mut settings = (trigger.build)(view);
            if settings.temporal.is_none() {
                settings = settings.temporal(Temporal {
                    start_tick: tick,
                    end_tick: None,
                });
            }
            debug_assert_eq!(settings.kind, Kind::Occurrence);
            view.create_entity(settings)?;
            created += 1;
            fired_subtypes.push(trigger.subtype.clone());
            self.registry
                .last_fired
                .borrow_mut()
                .insert(trigger.subtype.clone(), tick);
            view.add_history_event(EventKind::Simulation, format!("{} occurs.", trigger.subtype));
        }
        if created == 0 {
            return Ok(SystemResult::empty());
        }
        Ok(SystemResult {
            entities_touched: created,
            relationships_touched: 0,
            note: Some(fired_subtypes.join(", ")),
            enrichment: None,
        })
    }
}
