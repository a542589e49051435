use thiserror::Error;

use crate::registry::RegistryError;

/// Terminal failure of one generation session.
///
/// Parsing-layer conditions (incomplete data, malformed escapes,
/// unconfigured tools, unknown message types) are absorbed locally and
/// never surface here; only upstream stream errors and collaborator
/// failures cross the session boundary.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The model stream terminated with an error. The failure-tagged
    /// transcript has already been persisted when this is returned.
    #[error("model stream failed: {0}")]
    Stream(String),

    /// The transcript could not be persisted on successful completion.
    #[error("transcript persistence failed")]
    Persist(#[source] anyhow::Error),

    /// The dedup registry refused the session.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
