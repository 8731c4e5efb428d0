//! End-to-end coverage of loading a config from disk and the era/pressure
//! lookup helpers a domain wires the engine up with (§6.1).

use std::io::Write;

use worldhist_config::load_engine_config;

fn sample_config() -> &'static str {
    r#"{
        "epochLength": 15,
        "simulationTicksPerGrowth": 3,
        "maxTicks": 200,
        "targetEntitiesPerKind": {"npc": 30, "faction": 6, "location": 10},
        "relationshipBudget": {"maxPerSimulationTick": 8, "maxPerGrowthPhase": 25},
        "pressures": {"conflict": {"baseline": 10.0, "decay": 0.02}},
        "eras": [
            {"id": "dawn", "name": "The Dawn Age", "description": "first settlements",
             "minEraLength": 40, "transitionCooldown": 5,
             "systemModifiers": {"universalCatalyst": 0.8}},
            {"id": "strife", "name": "The Age of Strife", "description": "wars begin",
             "minEraLength": 60, "transitionCooldown": 5}
        ],
        "hardCap": 800,
        "seed": 1337
    }"#
}

#[test]
fn loaded_config_exposes_era_lookup_helpers() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", sample_config()).unwrap();
    let cfg = load_engine_config(file.path()).unwrap();

    assert_eq!(cfg.eras.len(), 2);
    assert!(cfg.era("dawn").is_some());
    assert!(cfg.era("nonexistent").is_none());
    assert_eq!(cfg.era_after("dawn").map(|e| e.id.clone()), Some("strife".to_string()));
    assert_eq!(cfg.first_era().map(|e| e.id.clone()), Some("dawn".to_string()));
    assert!((cfg.era("dawn").unwrap().system_modifier("universalCatalyst") - 0.8).abs() < f64::EPSILON);
}

#[test]
fn env_override_replaces_scalar_field() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", sample_config()).unwrap();
    std::env::set_var("WORLDHIST_MAX_TICKS", "999");
    let cfg = load_engine_config(file.path()).unwrap();
    std::env::remove_var("WORLDHIST_MAX_TICKS");
    assert_eq!(cfg.max_ticks, 999);
}
