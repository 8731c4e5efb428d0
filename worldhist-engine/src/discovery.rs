//! Emergent discovery (Glossary "Emergent discovery", SPEC_FULL [SUPPLEMENT]).
//!
//! New locations whose theme strings are composed from world state —
//! pressures, conflicts, magic presence — rather than from a fixed list.
//! `EngineConfig::emergent_discovery` only carries the numeric gating
//! (`enabled`, `cooldown_ticks`); theme composition itself draws on
//! whatever pressures are registered, so it has no domain-specific
//! vocabulary to hardcode here.

use std::cell::Cell;

use worldhist_config::EngineConfig;
use worldhist_core::{Kind, Prominence, Result, Status};
use worldhist_graph::{EntitySettings, EventKind, View};

use crate::system::{EnrichmentHint, System, SystemMeta, SystemResult};

/// Picks the highest-magnitude pressures as the theme's driving forces,
/// folds them into a subtype/description pair. Kept deterministic: ties
/// break by pressure id so repeat runs with the same seed and pressure
/// history emit identical theme strings.
fn compose_theme(pressures: &std::collections::BTreeMap<String, f64>) -> (String, String) {
    let mut ranked: Vec<(&String, &f64)> = pressures.iter().collect();
    ranked.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    let Some((leading_id, leading_value)) = ranked.first() else {
        return ("ruin".to_string(), "A place discovered with no clear origin.".to_string());
    };
    let subtype = if **leading_value >= 0.0 {
        format!("{leading_id}-touched site")
    } else {
        format!("{leading_id}-scarred site")
    };
    let description = format!(
        "A newly discovered location shaped by {leading_id} ({:+.1}).",
        leading_value
    );
    (subtype, description)
}

/// Cooldown-gated location discovery system. Fires at most once every
/// `cooldown_ticks` and only while `emergent_discovery.enabled`.
pub struct EmergentDiscovery {
    meta: SystemMeta,
    last_fired: Cell<Option<u64>>,
}

impl EmergentDiscovery {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: SystemMeta {
                id: "emergentDiscovery".to_string(),
                base_weight: 1.0,
            },
            last_fired: Cell::new(None),
        }
    }
}

impl Default for EmergentDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EmergentDiscovery {
    fn meta(&self) -> &SystemMeta {
        &self.meta
    }

    fn apply(&self, view: &mut View<'_, EngineConfig>, modifier: f64) -> Result<SystemResult> {
        let config = view.config().emergent_discovery.clone();
        if !config.enabled || modifier <= 0.0 {
            return Ok(SystemResult::empty());
        }
        let tick = view.tick();
        if let Some(last) = self.last_fired.get() {
            if tick.saturating_sub(last) < config.cooldown_ticks {
                return Ok(SystemResult::empty());
            }
        }

        let pressures: std::collections::BTreeMap<String, f64> = view
            .config()
            .pressures
            .keys()
            .map(|id| (id.clone(), view.get_pressure(id)))
            .collect();
        let (subtype, description) = compose_theme(&pressures);

        let name = format!("Unnamed {subtype}");
        let settings = EntitySettings::new(Kind::Location, subtype, name)
            .description(description)
            .status(Status::Active)
            .prominence(Prominence::Marginal);
        let id = view.create_entity(settings)?;
        self.last_fired.set(Some(tick));
        view.add_history_event(EventKind::Simulation, "A new location is discovered.");

        Ok(SystemResult {
            entities_touched: 1,
            relationships_touched: 0,
            note: Some("emergentDiscovery".to_string()),
            enrichment: Some(EnrichmentHint::DiscoveryEvent(id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_picks_highest_magnitude_pressure() {
        let mut pressures = std::collections::BTreeMap::new();
        pressures.insert("conflict".to_string(), -10.0);
        pressures.insert("magic".to_string(), 40.0);
        let (subtype, _) = compose_theme(&pressures);
        assert_eq!(subtype, "magic-touched site");
    }

    #[test]
    fn theme_falls_back_when_no_pressures_registered() {
        let (subtype, _) = compose_theme(&std::collections::BTreeMap::new());
        assert_eq!(subtype, "ruin");
    }

    #[test]
    fn ties_break_by_pressure_id() {
        let mut pressures = std::collections::BTreeMap::new();
        pressures.insert("zeta".to_string(), 5.0);
        pressures.insert("alpha".to_string(), 5.0);
        let (subtype, _) = compose_theme(&pressures);
        assert_eq!(subtype, "alpha-touched site");
    }
}
