//! Per-tool-call trigger-field extraction.
//!
//! One [`ArgumentExtractor`] exists per open tool call. It watches the
//! call's argument JSON as it streams in and emits a single
//! [`ProtocolMessage::ToolRequest`] the moment the configured trigger field
//! (for example a file path) has fully arrived - without waiting for the
//! rest of the argument object.

use weft_types::{ProtocolMessage, ToolCallId, ToolDescriptor};

use crate::scan;

/// Parse progress for one tool call.
///
/// `Init` is searching for the trigger key; `ParsingTrigger` is inside the
/// value string; `Done` means the value closed (notified or not) and every
/// further delta is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractorState {
    Init,
    ParsingTrigger,
    Done,
}

/// Incremental trigger-field extractor for a single tool call.
///
/// The raw buffer is append-only and the scan cursor only moves forward, so
/// a scan that comes up short is simply retried from the same position once
/// more data has arrived. Absence of a delimiter is never an error: it
/// means "not enough data yet".
#[derive(Debug)]
pub struct ArgumentExtractor {
    call_id: ToolCallId,
    tool_name: String,
    /// `None` means the tool is unconfigured and this extractor is a
    /// permanent no-op.
    descriptor: Option<ToolDescriptor>,
    state: ExtractorState,
    raw_buffer: String,
    scan_cursor: usize,
    trigger_value: Option<String>,
    notified: bool,
}

impl ArgumentExtractor {
    #[must_use]
    pub fn new(call_id: ToolCallId, tool_name: String, descriptor: Option<ToolDescriptor>) -> Self {
        Self {
            call_id,
            tool_name,
            descriptor,
            state: ExtractorState::Init,
            raw_buffer: String::new(),
            scan_cursor: 0,
            trigger_value: None,
            notified: false,
        }
    }

    /// Feed one argument delta; returns the messages to emit (at most one
    /// across the extractor's whole lifetime).
    pub fn process(&mut self, delta: &str) -> Vec<ProtocolMessage> {
        let mut messages = Vec::new();

        let Some(descriptor) = self.descriptor else {
            return messages;
        };
        if delta.is_empty() {
            return messages;
        }

        self.raw_buffer.push_str(delta);

        match self.state {
            ExtractorState::Init => self.scan_for_trigger_key(descriptor, &mut messages),
            ExtractorState::ParsingTrigger => self.parse_trigger_value(descriptor, &mut messages),
            ExtractorState::Done => {}
        }

        messages
    }

    /// Search for `"<field>"`, then a `:`, then the value's opening quote.
    /// All three must already be in the buffer; otherwise the cursor stays
    /// put and the search re-runs on the next delta.
    fn scan_for_trigger_key(
        &mut self,
        descriptor: ToolDescriptor,
        messages: &mut Vec<ProtocolMessage>,
    ) {
        let key = format!("\"{}\"", descriptor.trigger_field);

        let Some(key_offset) = self.raw_buffer[self.scan_cursor..].find(&key) else {
            return;
        };
        let after_key = self.scan_cursor + key_offset + key.len();

        let Some(colon_offset) = self.raw_buffer[after_key..].find(':') else {
            return;
        };
        let after_colon = after_key + colon_offset + 1;

        let Some(quote_offset) = self.raw_buffer[after_colon..].find('"') else {
            return;
        };

        self.scan_cursor = after_colon + quote_offset + 1;
        self.state = ExtractorState::ParsingTrigger;
        // A single delta may carry both the key and a complete value.
        self.parse_trigger_value(descriptor, messages);
    }

    fn parse_trigger_value(
        &mut self,
        descriptor: ToolDescriptor,
        messages: &mut Vec<ProtocolMessage>,
    ) {
        let Some(end_quote) = scan::find_string_end(&self.raw_buffer, self.scan_cursor) else {
            // Value (or an escape inside it) not closed yet.
            return;
        };

        let value = scan::unescape_json(&self.raw_buffer[self.scan_cursor..end_quote]);
        self.trigger_value = Some(value.clone());
        self.scan_cursor = end_quote + 1;

        if !self.notified {
            messages.push(ProtocolMessage::ToolRequest {
                id: self.call_id.clone(),
                name: self.tool_name.clone(),
                trigger_value: value,
                action: descriptor.action,
                arguments: None,
            });
            self.notified = true;
        }

        self.state = ExtractorState::Done;
    }

    /// Full accumulated argument JSON so far.
    #[must_use]
    pub fn raw_arguments(&self) -> &str {
        &self.raw_buffer
    }

    #[must_use]
    pub fn trigger_value(&self) -> Option<&str> {
        self.trigger_value.as_deref()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == ExtractorState::Done
    }
}
