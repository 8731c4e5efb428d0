//! Opaque, typed ids.
//!
//! The teacher represents entity ids as bare `String`; we use typed `Uuid`
//! newtypes instead so a relationship's `src`/`dst` can't be accidentally
//! swapped for some other id-shaped string at compile time. Both round-trip
//! to the same opaque string form the JSON export (§6) expects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

opaque_id!(EntityId);
opaque_id!(RelationshipId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        let id = EntityId::from_uuid(Uuid::new_v4());
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn entity_and_relationship_ids_are_distinct_types() {
        let raw = Uuid::new_v4();
        let e = EntityId::from_uuid(raw);
        let r = RelationshipId::from_uuid(raw);
        assert_eq!(e.as_uuid(), r.as_uuid());
    }
}
