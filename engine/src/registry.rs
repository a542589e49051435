//! Generation dedup registry contract.
//!
//! Cross-request concurrency is governed by an external registry keyed by
//! `(AppId, UserId)`: at most one active generation per key, with
//! check-and-set semantics on a shared store. The production registry
//! (Redis-backed) lives outside this crate; the core only consults the
//! trait. [`InMemoryRegistry`] is the contract's reference implementation,
//! used as a test double.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;
use weft_types::{AppId, UserId};

use crate::settings::SessionSettings;

/// A task older than this is treated as dead and its slot reclaimed.
pub const STALE_TASK_THRESHOLD: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a generation is already running for app {app}, user {user}")]
    AlreadyActive { app: AppId, user: UserId },
}

/// At-most-one-active-generation guarantee per `(app, user)` pair.
pub trait GenerationRegistry: Send + Sync {
    /// Claim the slot for this pair, failing if a live generation holds it.
    fn try_begin(&self, app: AppId, user: UserId) -> Result<(), RegistryError>;

    /// Release the slot. Safe to call for a slot that was never claimed.
    fn finish(&self, app: AppId, user: UserId);
}

/// Reference implementation over a process-local map.
#[derive(Debug)]
pub struct InMemoryRegistry {
    slots: Mutex<HashMap<(AppId, UserId), Instant>>,
    stale_after: Duration,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            stale_after: STALE_TASK_THRESHOLD,
        }
    }

    /// Registry honoring the settings' staleness threshold.
    #[must_use]
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new().with_stale_after(settings.stale_task_threshold)
    }

    /// Override the staleness threshold. Intended for tests.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationRegistry for InMemoryRegistry {
    fn try_begin(&self, app: AppId, user: UserId) -> Result<(), RegistryError> {
        let mut slots = self.slots.lock().expect("registry mutex poisoned");
        if let Some(started) = slots.get(&(app, user)) {
            if started.elapsed() < self.stale_after {
                return Err(RegistryError::AlreadyActive { app, user });
            }
            // Stale slot: the previous task is dead, reclaim it.
        }
        slots.insert((app, user), Instant::now());
        Ok(())
    }

    fn finish(&self, app: AppId, user: UserId) {
        let mut slots = self.slots.lock().expect("registry mutex poisoned");
        slots.remove(&(app, user));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use weft_types::{AppId, UserId};

    use crate::settings::SessionSettings;

    use super::{GenerationRegistry, InMemoryRegistry, RegistryError};

    const APP: AppId = AppId::new(1);
    const USER: UserId = UserId::new(7);

    #[test]
    fn second_begin_for_same_pair_fails() {
        let registry = InMemoryRegistry::new();
        registry.try_begin(APP, USER).unwrap();
        assert!(matches!(
            registry.try_begin(APP, USER),
            Err(RegistryError::AlreadyActive { .. })
        ));
        // A different pair is unaffected.
        registry.try_begin(AppId::new(2), USER).unwrap();
    }

    #[test]
    fn finish_releases_the_slot() {
        let registry = InMemoryRegistry::new();
        registry.try_begin(APP, USER).unwrap();
        registry.finish(APP, USER);
        registry.try_begin(APP, USER).unwrap();
    }

    #[test]
    fn finish_without_begin_is_harmless() {
        let registry = InMemoryRegistry::new();
        registry.finish(APP, USER);
        registry.try_begin(APP, USER).unwrap();
    }

    #[test]
    fn stale_slot_is_reclaimed() {
        let registry = InMemoryRegistry::new().with_stale_after(Duration::ZERO);
        registry.try_begin(APP, USER).unwrap();
        // The zero threshold makes the previous claim immediately stale.
        registry.try_begin(APP, USER).unwrap();
    }

    #[test]
    fn settings_threshold_governs_reclaim() {
        let mut settings = SessionSettings::default();
        settings.stale_task_threshold = Duration::ZERO;
        let registry = InMemoryRegistry::from_settings(&settings);
        registry.try_begin(APP, USER).unwrap();
        registry.try_begin(APP, USER).unwrap();

        // The default threshold keeps a fresh claim live.
        let registry = InMemoryRegistry::from_settings(&SessionSettings::default());
        registry.try_begin(APP, USER).unwrap();
        assert!(registry.try_begin(APP, USER).is_err());
    }
}
