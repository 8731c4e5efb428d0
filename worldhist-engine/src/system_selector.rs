//! System selector (§4.5): "Selection weights mirror templates: era
//! `systemModifiers × modifier × 1.0`. A system may be marked *always-run*;
//! others roll against a per-system base probability."

use worldhist_core::Rng;

/// Whether a system always fires or must roll against a probability.
#[derive(Debug, Clone, Copy)]
pub enum SystemSchedule {
    AlwaysRun,
    Probability(f64),
}

/// Decides whether `system_id` runs this tick, given its era modifier.
/// `base_weight` is folded in as `base_weight * era_modifier` and used
/// directly as the roll probability for `Probability` schedules (clamped to
/// `[0, 1]` by `Rng::roll`).
pub fn should_run(schedule: SystemSchedule, era_modifier: f64, base_weight: f64, rng: &mut Rng) -> bool {
    match schedule {
        SystemSchedule::AlwaysRun => true,
        SystemSchedule::Probability(base_probability) => {
            rng.roll_probability(base_probability * base_weight, era_modifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_run_never_rolls() {
        let mut rng = Rng::seeded(1);
        assert!(should_run(SystemSchedule::AlwaysRun, 0.0, 0.0, &mut rng));
    }

    #[test]
    fn zero_probability_never_fires() {
        let mut rng = Rng::seeded(1);
        for _ in 0..100 {
            assert!(!should_run(
                SystemSchedule::Probability(0.0),
                1.0,
                1.0,
                &mut rng
            ));
        }
    }
}
