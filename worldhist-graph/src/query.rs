//! Read-query criteria shared by `findEntities` and the restricted view.

use serde_json::Value;
use worldhist_core::{Kind, Prominence, Status};

/// Conjunctive filter for `Graph::find_entities` (§4.1): every `Some` field
/// must match.
#[derive(Debug, Clone, Default)]
pub struct EntityCriteria {
    pub kind: Option<Kind>,
    pub subtype: Option<String>,
    pub status: Option<Status>,
    pub prominence: Option<Prominence>,
    pub culture: Option<String>,
    pub tag: Option<(String, Value)>,
    pub exclude: Vec<worldhist_core::EntityId>,
}

impl EntityCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_prominence(mut self, prominence: Prominence) -> Self {
        self.prominence = Some(prominence);
        self
    }
}
