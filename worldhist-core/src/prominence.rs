//! The ordered prominence tier (§3) and its one-step-per-mutation helpers
//! (invariant 8).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prominence {
    Forgotten,
    Marginal,
    Recognized,
    Renowned,
    Mythic,
}

impl Prominence {
    const ORDER: [Prominence; 5] = [
        Self::Forgotten,
        Self::Marginal,
        Self::Recognized,
        Self::Renowned,
        Self::Mythic,
    ];

    #[must_use]
    pub fn step_up(self) -> Self {
        let idx = Self::ORDER.iter().position(|p| *p == self).unwrap_or(0);
        Self::ORDER[(idx + 1).min(Self::ORDER.len() - 1)]
    }

    #[must_use]
    pub fn step_down(self) -> Self {
        let idx = Self::ORDER.iter().position(|p| *p == self).unwrap_or(0);
        Self::ORDER[idx.saturating_sub(1)]
    }

    /// `prominenceMul` from §4.7: success-chance and attempt-chance
    /// multiplier keyed by prominence tier.
    #[must_use]
    pub const fn action_multiplier(self) -> f64 {
        match self {
            Self::Forgotten => 0.6,
            Self::Marginal => 0.8,
            Self::Recognized => 1.0,
            Self::Renowned => 1.2,
            Self::Mythic => 1.5,
        }
    }

    /// Entities at or above `Recognized` are eligible for `active_during`
    /// linking at era transitions (§4.6) and change-detection's prominence
    /// gate (§4.10).
    #[must_use]
    pub fn is_prominent(self) -> bool {
        self >= Self::Recognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_up_clamps_at_mythic() {
        assert_eq!(Prominence::Mythic.step_up(), Prominence::Mythic);
    }

    #[test]
    fn step_down_clamps_at_forgotten() {
        assert_eq!(Prominence::Forgotten.step_down(), Prominence::Forgotten);
    }

    #[test]
    fn is_prominent_threshold() {
        assert!(!Prominence::Marginal.is_prominent());
        assert!(Prominence::Recognized.is_prominent());
        assert!(Prominence::Mythic.is_prominent());
    }
}
