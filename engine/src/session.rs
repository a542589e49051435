//! One chat turn: multiplex raw events, render them, persist the
//! transcript, and trigger the post-completion build.

use std::path::Path;

use tokio::sync::mpsc;

use weft_protocol::StreamMultiplexer;
use weft_types::{
    AppId, GenerationMode, RenderedChunk, StreamEvent, StreamFinishReason, ToolCatalog, UserId,
};

use crate::consumer::MessageStreamConsumer;
use crate::errors::SessionError;
use crate::registry::GenerationRegistry;
use crate::settings::SessionSettings;

/// Persists the assistant's transcript. Called exactly once per session,
/// with either the success transcript or the failure-tagged one.
pub trait TranscriptStore: Send + Sync {
    fn save_assistant_message(&self, app: AppId, user: UserId, text: &str) -> anyhow::Result<()>;
}

/// Builds a generated project tree. Invoked synchronously, at most once
/// per session, only on successful completion of a buildable mode.
pub trait ProjectBuilder: Send + Sync {
    fn build_project(&self, path: &Path) -> anyhow::Result<()>;
}

/// Result of a successfully completed session.
#[derive(Debug)]
pub struct SessionOutcome {
    pub transcript: String,
    /// Error text when the post-completion build failed. The client
    /// stream had already closed at that point, so this is informational
    /// rather than fatal.
    pub build_failed: Option<String>,
}

/// A single streaming generation turn.
///
/// Owns one multiplexer and one consumer; all session state (extractor
/// map, seen-id set, transcript buffer) lives on this value and is moved
/// into `run`, never read from ambient thread-local context.
#[derive(Debug)]
pub struct GenerationSession {
    app: AppId,
    user: UserId,
    mode: GenerationMode,
    catalog: ToolCatalog,
    settings: SessionSettings,
}

impl GenerationSession {
    #[must_use]
    pub fn new(app: AppId, user: UserId, mode: GenerationMode) -> Self {
        Self {
            app,
            user,
            mode,
            catalog: ToolCatalog::default(),
            settings: SessionSettings::default(),
        }
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Drive the session to completion.
    ///
    /// Consumes raw model events from `events`, forwards rendered chunks
    /// to `output`, and on termination persists the transcript exactly
    /// once. For [`GenerationMode::Project`], the builder runs
    /// synchronously after successful persistence, before this returns.
    pub async fn run(
        self,
        store: &dyn TranscriptStore,
        builder: &dyn ProjectBuilder,
        registry: &dyn GenerationRegistry,
        events: mpsc::Receiver<StreamEvent>,
        output: mpsc::Sender<RenderedChunk>,
    ) -> Result<SessionOutcome, SessionError> {
        registry.try_begin(self.app, self.user)?;
        let (app, user) = (self.app, self.user);
        let result = self.run_inner(store, builder, events, output).await;
        registry.finish(app, user);
        result
    }

    async fn run_inner(
        self,
        store: &dyn TranscriptStore,
        builder: &dyn ProjectBuilder,
        mut events: mpsc::Receiver<StreamEvent>,
        output: mpsc::Sender<RenderedChunk>,
    ) -> Result<SessionOutcome, SessionError> {
        let mut multiplexer = StreamMultiplexer::new(self.catalog.clone());
        let mut consumer = MessageStreamConsumer::new(self.catalog.clone());

        let finish = loop {
            let Some(event) = events.recv().await else {
                tracing::warn!("model event channel disconnected before completion");
                break StreamFinishReason::Error("stream disconnected".to_string());
            };

            let (messages, finish) = multiplexer.apply_event(event);
            for message in messages {
                if let Some(chunk) = consumer.handle(message) {
                    // A dropped receiver means the client went away; the
                    // transcript is still persisted below.
                    if output.send(chunk).await.is_err() {
                        tracing::debug!("rendered output receiver dropped");
                    }
                }
            }
            if let Some(reason) = finish {
                break reason;
            }
        };
        drop(output);

        match finish {
            StreamFinishReason::Done => {
                let transcript = consumer.into_transcript();
                store
                    .save_assistant_message(self.app, self.user, &transcript)
                    .map_err(SessionError::Persist)?;

                let mut build_failed = None;
                if self.mode.is_buildable() {
                    let path = self.settings.project_path(self.app);
                    if let Err(err) = builder.build_project(&path) {
                        tracing::warn!(app = %self.app, "project build failed: {err:#}");
                        build_failed = Some(err.to_string());
                    }
                }

                Ok(SessionOutcome {
                    transcript,
                    build_failed,
                })
            }
            StreamFinishReason::Error(message) => {
                consumer.mark_failed(&message);
                let transcript = consumer.into_transcript();
                if let Err(err) = store.save_assistant_message(self.app, self.user, &transcript) {
                    tracing::warn!(app = %self.app, "failed to persist failure transcript: {err:#}");
                }
                Err(SessionError::Stream(message))
            }
        }
    }
}
