//! Shared primitives for the world history simulator.
//!
//! This crate has no knowledge of the graph, the config, or the engine; it
//! only carries the pieces every other crate needs to agree on: opaque ids,
//! the closed entity-kind/status/prominence vocabulary, the engine-wide
//! error type, and the single seeded RNG handle that keeps runs
//! reproducible.

pub mod error;
pub mod ids;
pub mod kind;
pub mod prominence;
pub mod rng;
pub mod status;

pub use error::{EngineError, Result};
pub use ids::{EntityId, RelationshipId};
pub use kind::Kind;
pub use prominence::Prominence;
pub use rng::Rng;
pub use status::Status;
