//! Streaming tool-call protocol layer.
//!
//! # Architecture
//!
//! A model turn arrives as a single interleaved event stream: assistant
//! text deltas, per-tool-call JSON argument deltas, and terminal tool
//! results. This crate converts that stream into an ordered sequence of
//! typed [`weft_types::ProtocolMessage`]s that a client can render before
//! any individual tool call has finished arriving:
//!
//! - [`scan`] - pure primitives over an accumulated buffer: find the end of
//!   a JSON string honoring escapes, and unescape a string body
//! - [`ArgumentExtractor`] - one per open tool call; emits at most one
//!   `ToolRequest` as soon as the call's trigger field has fully streamed in
//! - [`StreamMultiplexer`] - owns the per-call-id extractor map and fans
//!   raw [`weft_types::StreamEvent`]s into protocol messages over a
//!   [`tokio::sync::mpsc`] channel
//!
//! # Events
//!
//! | Raw event | Emitted messages |
//! |-----------|------------------|
//! | `TextDelta` | one `AiResponse` (content), immediately |
//! | `ToolCallDelta` | whatever the call's extractor returns (zero or one `ToolRequest`) |
//! | `ToolExecuted` | one `ToolExecuted`, unconditionally |
//! | `Done` / `Error` | none; the output closes |
//!
//! # Failure semantics
//!
//! Incomplete or malformed argument JSON never raises: a missing delimiter
//! means "not enough data yet", malformed `\uXXXX` hex is passed through
//! literally, and an unconfigured tool makes its extractor permanently
//! inert. Only the upstream `Error` event is terminal.

use tokio::sync::mpsc;

use weft_types::ProtocolMessage;

pub mod scan;

mod extractor;
mod multiplexer;

pub use extractor::ArgumentExtractor;
pub use multiplexer::StreamMultiplexer;

/// Bounded capacity for the typed message channel between multiplexer and
/// consumer.
pub const PROTOCOL_CHANNEL_CAPACITY: usize = 1024;

/// Channel pair for the typed message stream, sized for
/// [`StreamMultiplexer::run`].
#[must_use]
pub fn message_channel() -> (mpsc::Sender<ProtocolMessage>, mpsc::Receiver<ProtocolMessage>) {
    mpsc::channel(PROTOCOL_CHANNEL_CAPACITY)
}
