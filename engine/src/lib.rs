//! Message stream consumption and session orchestration for Weft.
//!
//! The protocol layer (`weft-protocol`) turns a model's raw event stream
//! into typed messages; this crate consumes those messages for one chat
//! turn:
//!
//! - [`MessageStreamConsumer`] - renders each message for the client,
//!   deduplicates per-tool-call notices, and accumulates the persistable
//!   transcript
//! - [`GenerationSession`] - owns one multiplexer and one consumer,
//!   consults the dedup registry, persists the transcript exactly once at
//!   termination, and triggers the post-completion project build
//! - collaborator traits ([`TranscriptStore`], [`ProjectBuilder`],
//!   [`GenerationRegistry`]) - the seams to persistence, build tooling,
//!   and the cross-request registry, all external to this core

mod consumer;
mod errors;
mod registry;
mod session;
mod settings;

pub use consumer::{MessageStreamConsumer, detect_language_by_path};
pub use errors::SessionError;
pub use registry::{GenerationRegistry, InMemoryRegistry, RegistryError, STALE_TASK_THRESHOLD};
pub use session::{GenerationSession, ProjectBuilder, SessionOutcome, TranscriptStore};
pub use settings::SessionSettings;
