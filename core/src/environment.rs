//! Injected dependencies for registry operations.
//!
//! External concerns (time, notification delivery) are abstracted behind
//! traits and bundled into a [`RegistryEnvironment`], so the registry stays a
//! deterministic state machine and tests can substitute fixed implementations.

use crate::notification::{NotificationBus, NullBus};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Clock trait - abstracts time operations for testability.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Dependencies injected into every registry instance.
#[derive(Clone)]
pub struct RegistryEnvironment {
    /// Clock for `rsvp_date`/`check_in_date`/notification timestamps
    pub clock: Arc<dyn Clock>,
    /// Sink for committed-transaction notifications
    pub bus: Arc<dyn NotificationBus>,
}

impl RegistryEnvironment {
    /// Creates an environment from explicit dependencies
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, bus: Arc<dyn NotificationBus>) -> Self {
        Self { clock, bus }
    }

    /// System clock, notifications dropped. Suitable when no collaborator
    /// subscribes (e.g. throwaway factory instances).
    #[must_use]
    pub fn detached() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(NullBus))
    }
}

impl std::fmt::Debug for RegistryEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEnvironment").finish_non_exhaustive()
    }
}
