//! Per-pressure baseline/decay config (§4.9). Not named as a top-level
//! config field in spec.md's `EngineConfig` shape but required by its own
//! body text ("each with a baseline and decay rate"); carried here rather
//! than guessed at inside the engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureSpec {
    pub baseline: f64,
    /// Multiplicative decay-toward-baseline rate applied once per tick,
    /// before pending deltas are folded in.
    pub decay: f64,
}

impl Default for PressureSpec {
    fn default() -> Self {
        Self {
            baseline: 0.0,
            decay: 0.05,
        }
    }
}
