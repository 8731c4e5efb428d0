//! Entity status and the monotone-toward-historical rule (invariant 4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Active,
    Historical,
    Current,
    Future,
}

impl Status {
    /// Invariant 4: status transitions are monotone toward `Historical`.
    /// `Historical` can never transition to anything else; every other
    /// status may become `Historical`. `Future -> Current` and
    /// `Current -> Historical` are the only other legal moves (eras).
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Historical, _) if !matches!(next, Self::Historical) => false,
            (Self::Future, Self::Current | Self::Historical) => true,
            (Self::Current, Self::Historical) => true,
            (Self::Active, Self::Historical) => true,
            (a, b) if a as u8 == b as u8 => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn historical_is_terminal() {
        assert!(!Status::Historical.can_transition_to(Status::Active));
        assert!(!Status::Historical.can_transition_to(Status::Current));
        assert!(Status::Historical.can_transition_to(Status::Historical));
    }

    #[test]
    fn era_lifecycle_moves_are_legal() {
        assert!(Status::Future.can_transition_to(Status::Current));
        assert!(Status::Current.can_transition_to(Status::Historical));
        assert!(!Status::Future.can_transition_to(Status::Active));
    }
}
