//! Drives the `run` entry point against a minimal on-disk config and checks
//! the three output files land where §6's CLI contract says they should.

use std::fs;
use std::io::Write;

fn minimal_config() -> &'static str {
    r#"{
        "epochLength": 10,
        "simulationTicksPerGrowth": 5,
        "maxTicks": 5,
        "targetEntitiesPerKind": {},
        "relationshipBudget": {"maxPerSimulationTick": 5, "maxPerGrowthPhase": 10},
        "eras": [
            {"id": "only", "name": "The Only Age", "description": "there is just one",
             "minEraLength": 1000, "transitionCooldown": 1000}
        ],
        "hardCap": 50,
        "seed": 5
    }"#
}

#[tokio::test]
async fn run_produces_world_state_statistics_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let mut file = fs::File::create(&config_path).unwrap();
    write!(file, "{}", minimal_config()).unwrap();

    let output_dir = dir.path().join("output");
    let valid = worldhist_cli::run::run(&config_path, &output_dir).await.unwrap();
    assert!(valid);

    assert!(output_dir.join("world_state.json").exists());
    assert!(output_dir.join("statistics.json").exists());
    assert!(output_dir.join("run.log").exists());
}
