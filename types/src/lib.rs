//! Core domain types for Weft.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the
//! application.

mod ids;
mod message;
mod tools;

pub use ids::{AppId, ToolCallId, UserId};
pub use message::{AiMessageKind, ProtocolMessage, RenderedChunk, WireError, decode_message};
pub use tools::{ToolAction, ToolCatalog, ToolDescriptor, descriptor_for};

use serde::{Deserialize, Serialize};

/// Raw event from the model client, one per streaming callback.
///
/// The model client collaborator produces these; the multiplexer consumes
/// them. Argument deltas for several call ids may interleave before any
/// individual call completes.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Assistant text content delta.
    TextDelta(String),
    /// Incremental fragment of one tool call's JSON argument text.
    ToolCallDelta {
        id: ToolCallId,
        name: String,
        arguments: String,
    },
    /// Terminal result of a tool call, carrying the full argument JSON.
    ToolExecuted {
        id: ToolCallId,
        name: String,
        arguments: String,
    },
    /// Stream completed.
    Done,
    /// Stream terminated with an error.
    Error(String),
}

/// Reason a stream finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFinishReason {
    Done,
    Error(String),
}

/// What kind of artifact a generation turn produces.
///
/// Only [`GenerationMode::Project`] yields a buildable project tree; the
/// other modes produce code that is saved but never built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Html,
    MultiFile,
    Project,
}

impl GenerationMode {
    #[must_use]
    pub fn is_buildable(self) -> bool {
        matches!(self, GenerationMode::Project)
    }
}
