//! Typed message stream consumption: dedup, rendering, transcript.

use std::collections::HashSet;

use weft_types::{
    AiMessageKind, ProtocolMessage, RenderedChunk, ToolAction, ToolCallId, ToolCatalog, WireError,
    decode_message,
};

/// Map a file path to a display language tag, for write/modify notices.
#[must_use]
pub fn detect_language_by_path(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    let ext = lower.rsplit('.').next().unwrap_or_default();
    match ext {
        "vue" => "vue",
        "js" => "javascript",
        "ts" => "typescript",
        "jsx" => "jsx",
        "tsx" => "tsx",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "html" => "html",
        "json" => "json",
        "md" => "markdown",
        "java" => "java",
        "py" => "python",
        "rs" => "rust",
        _ => "",
    }
}

/// Consumes the ordered message stream of one turn.
///
/// Produces the rendered text chunks for the client, accumulates the
/// persistable transcript, and deduplicates "first sighting" tool notices
/// per call id - a defensive second guard on top of the extractor layer's
/// at-most-one emission.
#[derive(Debug)]
pub struct MessageStreamConsumer {
    catalog: ToolCatalog,
    transcript: String,
    seen_tool_ids: HashSet<ToolCallId>,
}

impl MessageStreamConsumer {
    #[must_use]
    pub fn new(catalog: ToolCatalog) -> Self {
        Self {
            catalog,
            transcript: String::new(),
            seen_tool_ids: HashSet::new(),
        }
    }

    /// Handle one typed message; returns the chunk to forward downstream,
    /// or `None` when the message produces no client-visible output.
    pub fn handle(&mut self, message: ProtocolMessage) -> Option<RenderedChunk> {
        match message {
            ProtocolMessage::AiResponse { data, kind } => match kind {
                AiMessageKind::Content => {
                    self.transcript.push_str(&data);
                    Some(RenderedChunk::text(data))
                }
                // Transient operational status, never conversation content.
                AiMessageKind::Log => Some(RenderedChunk::status(data)),
            },
            ProtocolMessage::ToolRequest {
                id,
                trigger_value,
                action,
                ..
            } => {
                if !self.seen_tool_ids.insert(id) {
                    return None;
                }
                Some(RenderedChunk::text(render_request(action, &trigger_value)))
            }
            ProtocolMessage::ToolStreaming { delta, .. } => {
                // Pass-through for large-content params; not transcribed.
                Some(RenderedChunk::text(delta))
            }
            ProtocolMessage::ToolExecuted {
                id: _,
                name,
                arguments,
            } => {
                let summary = render_executed(&self.catalog, &name, &arguments);
                let output = format!("\n{summary}\n");
                // The only durable record of the tool's effect.
                self.transcript.push_str(&output);
                Some(RenderedChunk::text(output))
            }
        }
    }

    /// Handle one raw wire chunk, as re-delivered messages arrive as JSON.
    ///
    /// Unknown message types and malformed chunks are logged and dropped;
    /// neither terminates the stream.
    pub fn handle_chunk(&mut self, chunk: &str) -> Option<RenderedChunk> {
        match decode_message(chunk) {
            Ok(message) => self.handle(message),
            Err(WireError::UnknownType { tag }) => {
                tracing::warn!(%tag, "dropping message with unsupported type");
                None
            }
            Err(WireError::Malformed(err)) => {
                tracing::warn!(%err, "dropping malformed message chunk");
                None
            }
        }
    }

    /// Append the failure marker for an errored stream. The transcript
    /// then records everything received so far plus the error.
    pub fn mark_failed(&mut self, error: &str) {
        if !self.transcript.is_empty() && !self.transcript.ends_with('\n') {
            self.transcript.push('\n');
        }
        self.transcript.push_str("[generation failed] ");
        self.transcript.push_str(error);
    }

    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    #[must_use]
    pub fn into_transcript(self) -> String {
        self.transcript
    }
}

fn render_request(action: ToolAction, trigger_value: &str) -> String {
    match action {
        ToolAction::Write | ToolAction::Modify => {
            let lang = detect_language_by_path(trigger_value);
            if lang.is_empty() {
                format!("\n> {} `{trigger_value}`\n", action.in_progress())
            } else {
                format!("\n> {} `{trigger_value}` ({lang})\n", action.in_progress())
            }
        }
        ToolAction::Read | ToolAction::Delete | ToolAction::Search | ToolAction::Generate => {
            format!("\n> {} `{trigger_value}`\n", action.in_progress())
        }
    }
}

/// Summary of a completed tool call, derived from its full arguments via
/// the descriptor table. Falls back to the bare tool name for unconfigured
/// tools or unparseable arguments.
fn render_executed(catalog: &ToolCatalog, name: &str, arguments: &str) -> String {
    if let Some(descriptor) = catalog.descriptor(name) {
        let parsed: Option<serde_json::Value> = serde_json::from_str(arguments).ok();
        let value = parsed
            .as_ref()
            .and_then(|args| args.get(descriptor.trigger_field))
            .and_then(|value| value.as_str());
        if let Some(value) = value {
            return format!("{} `{value}`", descriptor.action.completed());
        }
    }
    format!("Completed `{name}`")
}
