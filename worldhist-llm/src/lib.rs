//! The out-of-process LLM worker contract (§6).
//!
//! Everything the prompt bodies actually say, and the HTTP/process
//! plumbing that talks to a text or image model, is explicitly out of
//! scope (§1) — this crate only carries the message shapes the engine
//! depends on to stay decoupled from that collaborator.

pub mod error;
pub mod messages;
pub mod worker;

pub use error::{LlmError, Result};
pub use messages::{EnrichmentResult, EnrichmentTask, EnrichmentType, TaskId, WireTaskKind};
pub use worker::{EnrichmentClient, NullEnrichmentClient};
