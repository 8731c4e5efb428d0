//! JSON config loading with environment-variable overrides (§6.1 AMBIENT),
//! via the `config` crate layered over `serde`, matching the teacher's
//! `llmspell-config` pattern.

use std::collections::HashSet;
use std::path::Path;

use config::{Config, File};

use crate::engine_config::EngineConfig;
use crate::error::{ConfigError, Result};

/// Loads `EngineConfig` from a JSON file, then lets environment variables
/// prefixed `WORLDHIST_` override individual top-level scalar fields (e.g.
/// `WORLDHIST_MAX_TICKS=500`), then validates the merged result.
pub fn load_engine_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let builder = Config::builder()
        .add_source(File::from(path))
        .add_source(config::Environment::with_prefix("WORLDHIST").separator("__"));
    let settings = builder.build()?;
    let cfg: EngineConfig = settings.try_deserialize()?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Structural validation run once at load time (§6.1, §7 ConfigError).
pub fn validate(cfg: &EngineConfig) -> Result<()> {
    if cfg.eras.is_empty() {
        return Err(ConfigError::Invalid("eras must not be empty".into()));
    }
    let mut seen = HashSet::new();
    for era in &cfg.eras {
        if !seen.insert(era.id.clone()) {
            return Err(ConfigError::Invalid(format!("duplicate era id: {}", era.id)));
        }
    }
    if cfg.max_ticks == 0 {
        return Err(ConfigError::Invalid("maxTicks must be > 0".into()));
    }
    if cfg.relationship_budget.max_per_simulation_tick == 0 {
        return Err(ConfigError::Invalid(
            "relationshipBudget.maxPerSimulationTick must be > 0".into(),
        ));
    }
    if cfg.simulation_ticks_per_growth == 0 {
        return Err(ConfigError::Invalid(
            "simulationTicksPerGrowth must be > 0".into(),
        ));
    }
    for domain in &cfg.action_domains {
        for action in &domain.actions {
            if !(0.0..=1.0).contains(&action.base_success_chance) {
                return Err(ConfigError::Invalid(format!(
                    "action {} has out-of-range baseSuccessChance",
                    action.id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_json() -> &'static str {
        r#"{
            "epochLength": 20,
            "simulationTicksPerGrowth": 5,
            "maxTicks": 300,
            "targetEntitiesPerKind": {"npc": 20, "faction": 5},
            "relationshipBudget": {"maxPerSimulationTick": 10, "maxPerGrowthPhase": 30},
            "eras": [
                {"id": "early", "name": "Early Age", "description": "the start",
                 "minEraLength": 50, "transitionCooldown": 10}
            ],
            "hardCap": 500,
            "seed": 42
        }"#
    }

    #[test]
    fn loads_and_validates_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", minimal_json()).unwrap();
        let cfg = load_engine_config(file.path()).unwrap();
        assert_eq!(cfg.eras.len(), 1);
        assert_eq!(cfg.seed, 42);
    }

    #[test]
    fn rejects_empty_eras() {
        let cfg_json = minimal_json().replace(r#""eras": [
                {"id": "early", "name": "Early Age", "description": "the start",
                 "minEraLength": 50, "transitionCooldown": 10}
            ],"#, r#""eras": [],"#);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", cfg_json).unwrap();
        let err = load_engine_config(file.path());
        assert!(err.is_err());
    }
}
