//! Typed protocol messages and their wire representation.
//!
//! Every message the multiplexer emits is one discriminated JSON object with
//! a `type` tag. The consumer's rendered output is a separate, flatter shape
//! ([`RenderedChunk`]) carrying plain text in a `d` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::ToolCallId;
use crate::tools::ToolAction;

/// Classification of an `ai_response` payload.
///
/// `Content` is conversation text and belongs in the transcript; `Log` is a
/// transient operational status line and does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiMessageKind {
    Content,
    Log,
}

/// One typed message on the multiplexer's output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolMessage {
    /// Assistant text, either conversation content or a status line.
    AiResponse {
        data: String,
        #[serde(rename = "msgType")]
        kind: AiMessageKind,
    },
    /// First sighting of a tool call: the trigger field has fully arrived.
    ///
    /// At most one per [`ToolCallId`] is produced by the extractor layer;
    /// the consumer deduplicates again on re-delivery.
    ToolRequest {
        id: ToolCallId,
        name: String,
        #[serde(rename = "filePath")]
        trigger_value: String,
        action: ToolAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<String>,
    },
    /// Incremental text of a large-content parameter. Reserved: the
    /// extractor contract does not require producing it, but it must be
    /// representable on the wire.
    ToolStreaming {
        id: ToolCallId,
        #[serde(rename = "paramName")]
        param_name: String,
        delta: String,
    },
    /// Terminal record of a tool call. Single source of truth for the
    /// tool's final arguments; never deduplicated.
    ToolExecuted {
        id: ToolCallId,
        name: String,
        arguments: String,
    },
}

impl ProtocolMessage {
    #[must_use]
    pub fn content(data: impl Into<String>) -> Self {
        ProtocolMessage::AiResponse {
            data: data.into(),
            kind: AiMessageKind::Content,
        }
    }

    #[must_use]
    pub fn log(data: impl Into<String>) -> Self {
        ProtocolMessage::AiResponse {
            data: data.into(),
            kind: AiMessageKind::Log,
        }
    }

    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            ProtocolMessage::AiResponse { .. } => "ai_response",
            ProtocolMessage::ToolRequest { .. } => "tool_request",
            ProtocolMessage::ToolStreaming { .. } => "tool_streaming",
            ProtocolMessage::ToolExecuted { .. } => "tool_executed",
        }
    }
}

/// Rendered consumer output: plain text for the client transport.
///
/// Status lines carry `msgType: "log"`; conversation text omits the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedChunk {
    pub d: String,
    #[serde(
        rename = "msgType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub msg_type: Option<AiMessageKind>,
}

impl RenderedChunk {
    #[must_use]
    pub fn text(d: impl Into<String>) -> Self {
        Self {
            d: d.into(),
            msg_type: None,
        }
    }

    #[must_use]
    pub fn status(d: impl Into<String>) -> Self {
        Self {
            d: d.into(),
            msg_type: Some(AiMessageKind::Log),
        }
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed message chunk: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unsupported message type: {tag:?}")]
    UnknownType { tag: String },
}

/// Decode one wire chunk into a typed message.
///
/// Distinguishes a chunk that is not JSON at all from one whose `type` tag
/// is unknown, so the consumer can drop the latter without treating it as a
/// transport fault.
pub fn decode_message(chunk: &str) -> Result<ProtocolMessage, WireError> {
    let value: serde_json::Value = serde_json::from_str(chunk).map_err(WireError::Malformed)?;
    match serde_json::from_value(value.clone()) {
        Ok(message) => Ok(message),
        Err(err) => {
            let tag = value
                .get("type")
                .and_then(|tag| tag.as_str())
                .map(str::to_string);
            match tag {
                Some(tag)
                    if !matches!(
                        tag.as_str(),
                        "ai_response" | "tool_request" | "tool_streaming" | "tool_executed"
                    ) =>
                {
                    Err(WireError::UnknownType { tag })
                }
                Some(_) | None => Err(WireError::Malformed(err)),
            }
        }
    }
}
