//! A small end-to-end run wiring a single growth template into
//! [`Engine::builder`] with the default (domain-less) collaborators,
//! exercising the full tick loop, export, and the determinism law (§8).

use std::collections::BTreeMap;

use worldhist_config::{EngineConfig, EraConfig, RelationshipBudget};
use worldhist_core::{Kind, Result};
use worldhist_engine::{Engine, Expansion, ExpandOutcome, GrowthTemplate, TemplateMeta};
use worldhist_graph::{EntitySettings, View};

struct SpawnNpc(TemplateMeta);

impl SpawnNpc {
    fn new() -> Self {
        Self(TemplateMeta {
            id: "spawn_npc".to_string(),
            produces_kind: Kind::Npc,
            base_weight: 1.0,
            pressure_modifiers: BTreeMap::new(),
        })
    }
}

impl GrowthTemplate for SpawnNpc {
    fn meta(&self) -> &TemplateMeta {
        &self.0
    }

    fn can_apply(&self, view: &View<'_, EngineConfig>) -> bool {
        view.get_entities_by_kind(Kind::Npc).len() < 50
    }

    fn find_targets(&self, _view: &View<'_, EngineConfig>) -> Vec<worldhist_core::EntityId> {
        vec![worldhist_core::EntityId::from_uuid(uuid::Uuid::nil())]
    }

    fn expand(&self, view: &View<'_, EngineConfig>, _target: worldhist_core::EntityId) -> Result<ExpandOutcome> {
        let n = view.get_entities_by_kind(Kind::Npc).len();
        Ok(ExpandOutcome {
            expansions: vec![Expansion::NewEntity {
                settings: EntitySettings::new(Kind::Npc, "commoner", format!("npc-{n}")),
                link_to: None,
            }],
            description: Some("a commoner is born".to_string()),
            pressure_changes: BTreeMap::new(),
        })
    }
}

fn config(seed: u64) -> EngineConfig {
    let mut target_entities_per_kind = BTreeMap::new();
    target_entities_per_kind.insert("npc".to_string(), 20);

    EngineConfig {
        epoch_length: 10,
        simulation_ticks_per_growth: 2,
        max_ticks: 40,
        target_entities_per_kind,
        relationship_budget: RelationshipBudget {
            max_per_simulation_tick: 10,
            max_per_growth_phase: 20,
        },
        pressures: BTreeMap::new(),
        eras: vec![EraConfig {
            id: "early".to_string(),
            name: "The Early Age".to_string(),
            description: "a quiet beginning".to_string(),
            template_weights: BTreeMap::new(),
            system_modifiers: BTreeMap::new(),
            pressure_modifiers: BTreeMap::new(),
            min_era_length: 1000,
            transition_cooldown: 1000,
            transition_conditions: Some(vec![]),
            transition_effects: Default::default(),
            entry_effects: Default::default(),
        }],
        action_domains: vec![],
        distribution_targets: None,
        emergent_discovery: Default::default(),
        hard_cap: 200,
        deficit_alpha: 2.0,
        max_runs_per_template: 50,
        growth_metrics_window: 10,
        seed,
    }
}

fn run_once(seed: u64) -> worldhist_engine::ExportedState {
    let mut engine = Engine::builder(config(seed))
        .template(Box::new(SpawnNpc::new()))
        .build();
    engine.run().unwrap();
    engine.export()
}

#[test]
fn tick_loop_grows_the_population_toward_target() {
    let state = run_once(99);
    let npc_count = state.entities.iter().filter(|e| e.kind == Kind::Npc).count();
    assert!(npc_count > 0, "expected at least one npc after a full run");
    assert_eq!(state.tick, 40);
}

#[test]
fn identical_seed_and_config_produce_byte_identical_export() {
    let a = run_once(42);
    let b = run_once(42);
    let json_a = serde_json::to_string(&a).unwrap();
    let json_b = serde_json::to_string(&b).unwrap();
    assert_eq!(json_a, json_b);
}
