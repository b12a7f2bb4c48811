//! # InviteMe Testing
//!
//! Testing utilities for the registry workspace:
//!
//! - Mock implementations of the environment traits (fixed clock, capturing
//!   notification bus)
//! - Identity and event fixtures shared across test suites
//! - A fluent Given-When-Then harness for registry operations
//! - Tracing setup for test output
//!
//! ## Example
//!
//! ```
//! use inviteme_testing::{fixtures, mocks, ScenarioTest};
//! use inviteme_core::types::InviteStatus;
//!
//! ScenarioTest::new(mocks::test_env().0)
//!     .given(|registry| {
//!         let event_id = fixtures::birthday_party(registry);
//!         registry
//!             .mint_invite(&fixtures::host(), event_id, &fixtures::guest(), "ipfs://1")
//!             .unwrap();
//!     })
//!     .when(|registry| registry.rsvp(&fixtures::guest(), inviteme_core::TokenId::new(1), true))
//!     .then_ok(|()| {})
//!     .then_state(|registry| {
//!         let invite = registry.invite(inviteme_core::TokenId::new(1)).unwrap();
//!         assert_eq!(invite.status, InviteStatus::Accepted);
//!     })
//!     .run();
//! ```

pub mod mocks {
    //! Mock implementations of the environment traits.

    use chrono::{DateTime, Utc};
    use inviteme_core::environment::{Clock, RegistryEnvironment};
    use inviteme_core::notification::{Notification, NotificationBus, NotificationKind};
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests; always returns the same time.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which should never
    /// happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Notification bus that records everything emitted, in emit order.
    #[derive(Debug, Default)]
    pub struct CapturingBus {
        notifications: Mutex<Vec<Notification>>,
    }

    impl CapturingBus {
        /// Creates an empty capturing bus
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Everything emitted so far, in emit order
        ///
        /// # Panics
        ///
        /// Panics if the interior lock was poisoned by a panicking test.
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications
                .lock()
                .expect("capturing bus lock poisoned")
                .clone()
        }

        /// Just the kinds, for order assertions
        #[must_use]
        pub fn kinds(&self) -> Vec<NotificationKind> {
            self.notifications().iter().map(|n| n.kind).collect()
        }

        /// Number of notifications captured
        #[must_use]
        pub fn len(&self) -> usize {
            self.notifications().len()
        }

        /// True when nothing has been emitted
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl NotificationBus for CapturingBus {
        #[allow(clippy::expect_used)]
        fn emit(&self, notification: &Notification) {
            self.notifications
                .lock()
                .expect("capturing bus lock poisoned")
                .push(notification.clone());
        }
    }

    /// Environment with a fixed clock and a capturing bus; the bus handle is
    /// returned alongside so tests can assert on the emitted stream.
    #[must_use]
    pub fn test_env() -> (RegistryEnvironment, Arc<CapturingBus>) {
        let bus = Arc::new(CapturingBus::new());
        let env = RegistryEnvironment::new(Arc::new(test_clock()), bus.clone());
        (env, bus)
    }
}

pub mod fixtures {
    //! Shared identities and canned setup for registry tests.

    use inviteme_core::registry::InviteRegistry;
    use inviteme_core::types::{EventId, Identity};

    /// The canonical event host
    #[must_use]
    pub fn host() -> Identity {
        Identity::new("0xhost")
    }

    /// The canonical invited guest
    #[must_use]
    pub fn guest() -> Identity {
        Identity::new("0xguest")
    }

    /// An identity with no role in any fixture event
    #[must_use]
    pub fn stranger() -> Identity {
        Identity::new("0xstranger")
    }

    /// Creates the standard fixture event (capacity 50, hosted by
    /// [`host()`]) and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if creation fails, which indicates a broken test setup.
    #[allow(clippy::expect_used)]
    pub fn birthday_party(registry: &mut InviteRegistry) -> EventId {
        registry
            .create_event(
                &host(),
                "Birthday Party",
                chrono::Utc::now() + chrono::Duration::days(7),
                "123 Main St",
                50,
                false,
            )
            .expect("fixture event should always be creatable")
    }
}

mod scenario;

pub use mocks::{test_clock, FixedClock};
pub use scenario::ScenarioTest;

/// Tracing setup for test output.
pub mod logging {
    use tracing_subscriber::EnvFilter;

    /// Initializes a fmt subscriber honoring `RUST_LOG`; safe to call from
    /// every test, later calls are no-ops.
    pub fn init() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
