//! Hook the store calls into on every tag write so `worldhist-engine`'s tag
//! registry (§4.13) can reject conflicting kind usage without the graph
//! crate knowing anything about registries.

use serde_json::Value;
use worldhist_core::Kind;

use crate::error::Result;

pub trait TagValidator: Send {
    /// Called before a tag write is committed. Implementations may mutate
    /// their own bookkeeping (e.g. auto-register an unseen key) but must
    /// not touch the graph.
    fn validate(&mut self, kind: Kind, key: &str, value: &Value) -> Result<()>;
}

/// Used when no registry is wired in (tests, or domains that opt out of
/// tag validation entirely).
#[derive(Debug, Default)]
pub struct NullTagValidator;

impl TagValidator for NullTagValidator {
    fn validate(&mut self, _kind: Kind, _key: &str, _value: &Value) -> Result<()> {
        Ok(())
    }
}
