//! Per-process session settings.

use std::path::PathBuf;
use std::time::Duration;

use weft_types::AppId;

use crate::registry::STALE_TASK_THRESHOLD;

/// Fixed configuration for generation sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Root directory under which generated project trees are saved.
    pub output_root: PathBuf,
    /// How old a registered generation task may be before its slot is
    /// reclaimable.
    pub stale_task_threshold: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("tmp/code_output"),
            stale_task_threshold: STALE_TASK_THRESHOLD,
        }
    }
}

impl SessionSettings {
    #[must_use]
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// Directory of the generated project for one application.
    #[must_use]
    pub fn project_path(&self, app: AppId) -> PathBuf {
        self.output_root.join(format!("project_{app}"))
    }
}
