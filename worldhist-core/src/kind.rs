//! The closed entity-kind vocabulary (§3, Design Note on dynamic dispatch).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every entity carries one of these. Domain kinds (`Npc`, `Faction`,
/// `Location`, `Abilities`, `Rules`) are produced by growth templates and
/// catalyst handlers; framework kinds (`Era`, `Occurrence`) are produced by
/// the engine's own systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Npc,
    Faction,
    Location,
    Abilities,
    Rules,
    Era,
    Occurrence,
}

impl Kind {
    /// Domain kinds are the ones growth templates normally target and the
    /// ones `targetEntitiesPerKind` deficits are computed over. Framework
    /// kinds are excluded (Open Question 3, decided in DESIGN.md).
    #[must_use]
    pub const fn is_domain_kind(self) -> bool {
        !matches!(self, Self::Era | Self::Occurrence)
    }

    #[must_use]
    pub const fn is_framework_kind(self) -> bool {
        !self.is_domain_kind()
    }

    #[must_use]
    pub const fn all() -> [Kind; 7] {
        [
            Self::Npc,
            Self::Faction,
            Self::Location,
            Self::Abilities,
            Self::Rules,
            Self::Era,
            Self::Occurrence,
        ]
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Npc => "npc",
            Self::Faction => "faction",
            Self::Location => "location",
            Self::Abilities => "abilities",
            Self::Rules => "rules",
            Self::Era => "era",
            Self::Occurrence => "occurrence",
        };
        write!(f, "{s}")
    }
}
