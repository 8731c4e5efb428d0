//! `EngineConfig` and the narrow contracts for the collaborators §1 keeps
//! out of scope: the domain lore provider and per-domain validation/pressure
//! hooks.

pub mod action;
pub mod domain;
pub mod engine_config;
pub mod era;
pub mod error;
pub mod load;
pub mod pressure;

pub use action::{ActionConfig, ActionDomainConfig, ActionRequirements};
pub use domain::{DomainCallbacks, LoreProvider, NullDomainCallbacks, NullLoreProvider};
pub use engine_config::{
    DistributionTargets, EmergentDiscoveryConfig, EngineConfig, RelationshipBudget,
};
pub use era::{Comparator, EraConfig, OccurrenceTest, PressureEffects, TransitionCondition};
pub use error::{ConfigError, Result};
pub use load::{load_engine_config, validate};
pub use pressure::PressureSpec;
