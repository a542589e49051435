//! Fans a model's raw event stream into ordered typed protocol messages.

use std::collections::HashMap;

use tokio::sync::mpsc;

use weft_types::{ProtocolMessage, StreamEvent, StreamFinishReason, ToolCallId, ToolCatalog};

use crate::extractor::ArgumentExtractor;

/// Per-turn event multiplexer.
///
/// Owns one [`ArgumentExtractor`] per open tool call, created lazily on the
/// first delta for a new call id, so deltas from concurrently-open calls
/// cannot corrupt each other's parse state. One multiplexer instance serves
/// exactly one streaming session; all state lives on the instance, never in
/// thread-locals.
#[derive(Debug)]
pub struct StreamMultiplexer {
    catalog: ToolCatalog,
    extractors: HashMap<ToolCallId, ArgumentExtractor>,
    closed: bool,
}

impl StreamMultiplexer {
    #[must_use]
    pub fn new(catalog: ToolCatalog) -> Self {
        Self {
            catalog,
            extractors: HashMap::new(),
            closed: false,
        }
    }

    /// Apply one raw event, returning the messages to emit (in order) and
    /// the finish reason when the event was terminal.
    ///
    /// After a terminal event the multiplexer is closed: every further
    /// event produces nothing.
    pub fn apply_event(
        &mut self,
        event: StreamEvent,
    ) -> (Vec<ProtocolMessage>, Option<StreamFinishReason>) {
        if self.closed {
            return (Vec::new(), None);
        }

        match event {
            StreamEvent::TextDelta(text) => (vec![ProtocolMessage::content(text)], None),
            StreamEvent::ToolCallDelta {
                id,
                name,
                arguments,
            } => {
                let extractor = self.extractors.entry(id.clone()).or_insert_with(|| {
                    ArgumentExtractor::new(id, name.clone(), self.catalog.descriptor(&name))
                });
                (extractor.process(&arguments), None)
            }
            StreamEvent::ToolExecuted {
                id,
                name,
                arguments,
            } => {
                // Authoritative record of the call's final arguments;
                // emitted regardless of extractor state, never deduplicated
                // here.
                let message = ProtocolMessage::ToolExecuted {
                    id,
                    name,
                    arguments,
                };
                (vec![message], None)
            }
            StreamEvent::Done => {
                self.closed = true;
                (Vec::new(), Some(StreamFinishReason::Done))
            }
            StreamEvent::Error(message) => {
                self.closed = true;
                (Vec::new(), Some(StreamFinishReason::Error(message)))
            }
        }
    }

    /// Pump raw events from `events` into `output` until the stream
    /// terminates.
    ///
    /// The output channel is closed (by drop) on return, with no further
    /// emissions after the terminal event. If the producer hangs up without
    /// a terminal event, that is reported as a stream error; if the
    /// receiver hangs up, remaining messages are abandoned rather than
    /// flushed.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<StreamEvent>,
        output: mpsc::Sender<ProtocolMessage>,
    ) -> StreamFinishReason {
        while let Some(event) = events.recv().await {
            let (messages, finish) = self.apply_event(event);
            for message in messages {
                if output.send(message).await.is_err() {
                    tracing::warn!("protocol output receiver dropped; abandoning stream");
                    return StreamFinishReason::Error("output channel closed".to_string());
                }
            }
            if let Some(reason) = finish {
                return reason;
            }
        }

        tracing::warn!("model event channel disconnected before completion");
        StreamFinishReason::Error("stream disconnected".to_string())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use weft_types::{
        AiMessageKind, ProtocolMessage, StreamEvent, StreamFinishReason, ToolCallId, ToolCatalog,
    };

    use super::StreamMultiplexer;

    fn mux() -> StreamMultiplexer {
        StreamMultiplexer::new(ToolCatalog::default())
    }

    fn delta(id: &str, name: &str, arguments: &str) -> StreamEvent {
        StreamEvent::ToolCallDelta {
            id: ToolCallId::from(id),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn text_deltas_are_forwarded_in_arrival_order() {
        let mut mux = mux();
        let (first, finish) = mux.apply_event(StreamEvent::TextDelta("Hello ".to_string()));
        assert!(finish.is_none());
        let (second, _) = mux.apply_event(StreamEvent::TextDelta("world".to_string()));

        assert_eq!(first, vec![ProtocolMessage::content("Hello ")]);
        assert_eq!(second, vec![ProtocolMessage::content("world")]);
        match &first[0] {
            ProtocolMessage::AiResponse { kind, .. } => assert_eq!(*kind, AiMessageKind::Content),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn interleaved_calls_keep_independent_extractor_state() {
        let mut mux = mux();

        // A's key arrives, then B's complete arguments, then A's value.
        let (out, _) = mux.apply_event(delta("a", "writeFile", r#"{"relativeFilePath":"#));
        assert!(out.is_empty());

        let (out, _) = mux.apply_event(delta("b", "deleteFile", r#"{"relativeFilePath":"old.js"}"#));
        assert_eq!(out.len(), 1);
        match &out[0] {
            ProtocolMessage::ToolRequest { id, trigger_value, .. } => {
                assert_eq!(id.as_str(), "b");
                assert_eq!(trigger_value, "old.js");
            }
            other => panic!("unexpected message {other:?}"),
        }

        let (out, _) = mux.apply_event(delta("a", "writeFile", r#""src/App.vue"}"#));
        assert_eq!(out.len(), 1);
        match &out[0] {
            ProtocolMessage::ToolRequest { id, trigger_value, .. } => {
                assert_eq!(id.as_str(), "a");
                assert_eq!(trigger_value, "src/App.vue");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn tool_executed_is_emitted_unconditionally() {
        let mut mux = mux();
        // No prior delta for this id, and an unconfigured tool name.
        let (out, finish) = mux.apply_event(StreamEvent::ToolExecuted {
            id: ToolCallId::from("x"),
            name: "launchRocket".to_string(),
            arguments: r#"{"target":"moon"}"#.to_string(),
        });
        assert!(finish.is_none());
        assert_eq!(
            out,
            vec![ProtocolMessage::ToolExecuted {
                id: ToolCallId::from("x"),
                name: "launchRocket".to_string(),
                arguments: r#"{"target":"moon"}"#.to_string(),
            }]
        );
    }

    #[test]
    fn emitted_tool_request_carries_the_wire_shape() {
        let mut mux = mux();
        let (out, _) = mux.apply_event(delta("a", "writeFile", r#"{"relativeFilePath":"src/App.vue"}"#));
        assert_eq!(out.len(), 1);

        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["type"], "tool_request");
        assert_eq!(json["id"], "a");
        assert_eq!(json["name"], "writeFile");
        assert_eq!(json["filePath"], "src/App.vue");
        assert_eq!(json["action"], "write");
    }

    #[test]
    fn nothing_is_emitted_after_done() {
        let mut mux = mux();
        let (out, finish) = mux.apply_event(StreamEvent::Done);
        assert!(out.is_empty());
        assert_eq!(finish, Some(StreamFinishReason::Done));

        let (out, finish) = mux.apply_event(StreamEvent::TextDelta("late".to_string()));
        assert!(out.is_empty());
        assert!(finish.is_none());
    }

    #[test]
    fn error_closes_the_multiplexer_exactly_once() {
        let mut mux = mux();
        let (_, finish) = mux.apply_event(StreamEvent::Error("boom".to_string()));
        assert_eq!(finish, Some(StreamFinishReason::Error("boom".to_string())));

        // A second terminal event is swallowed.
        let (out, finish) = mux.apply_event(StreamEvent::Done);
        assert!(out.is_empty());
        assert!(finish.is_none());
    }

    #[tokio::test]
    async fn run_pumps_until_done_and_closes_output() {
        let (event_tx, event_rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = crate::message_channel();

        let pump = tokio::spawn(mux().run(event_rx, out_tx));

        event_tx
            .send(StreamEvent::TextDelta("hi".to_string()))
            .await
            .unwrap();
        event_tx
            .send(delta("a", "writeFile", r#"{"relativeFilePath":"a.vue"}"#))
            .await
            .unwrap();
        event_tx.send(StreamEvent::Done).await.unwrap();

        let mut received = Vec::new();
        while let Some(message) = out_rx.recv().await {
            received.push(message);
        }
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], ProtocolMessage::content("hi"));
        assert!(matches!(received[1], ProtocolMessage::ToolRequest { .. }));

        assert_eq!(pump.await.unwrap(), StreamFinishReason::Done);
    }

    #[tokio::test]
    async fn run_reports_disconnect_as_error() {
        let (event_tx, event_rx) = mpsc::channel::<StreamEvent>(4);
        let (out_tx, _out_rx) = mpsc::channel(4);

        drop(event_tx);
        let reason = mux().run(event_rx, out_tx).await;
        assert_eq!(
            reason,
            StreamFinishReason::Error("stream disconnected".to_string())
        );
    }
}
