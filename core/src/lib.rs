//! # InviteMe Core
//!
//! The invite token/event registry and its instance lifecycle manager.
//!
//! The registry is a deterministic, single-writer data structure: every
//! mutating operation is a transaction that either commits completely or
//! rejects without observable effect, and every commit emits exactly one
//! notification record per state change, in commit order. How the registry is
//! persisted, replicated, or exposed over HTTP is an external concern; see
//! `inviteme-runtime` for the serialization layer and `inviteme-projections`
//! for the read-side collaborators.
//!
//! ## Core Concepts
//!
//! - **Identity**: opaque, equality-comparable actor id ([`types::Identity`])
//! - **Registry**: owns events, invites, counters, and all transition logic
//!   ([`registry::InviteRegistry`])
//! - **Factory**: owns registry instances and the explicit active pointer
//!   ([`factory::RegistryFactory`])
//! - **Notifications**: committed-transaction records for external
//!   collaborators ([`notification::Notification`])
//! - **Environment**: injected clock and notification bus
//!   ([`environment::RegistryEnvironment`])
//!
//! ## Example
//!
//! ```
//! use inviteme_core::environment::RegistryEnvironment;
//! use inviteme_core::registry::InviteRegistry;
//! use inviteme_core::types::Identity;
//! use chrono::{Duration, Utc};
//!
//! let mut registry = InviteRegistry::new(RegistryEnvironment::detached());
//! let host = Identity::new("0xhost");
//! let guest = Identity::new("0xguest");
//!
//! let event_id = registry
//!     .create_event(&host, "Birthday Party", Utc::now() + Duration::days(7),
//!                   "123 Main St", 50, false)
//!     .unwrap();
//! let token_id = registry
//!     .mint_invite(&host, event_id, &guest, "ipfs://invite/1.json")
//!     .unwrap();
//!
//! registry.rsvp(&guest, token_id, true).unwrap();
//! registry.check_in(&host, token_id).unwrap();
//! ```

pub mod environment;
pub mod error;
pub mod factory;
pub mod notification;
pub mod registry;
pub mod types;

pub use error::{ErrorKind, RegistryError};
pub use factory::{InstanceId, RegistryFactory};
pub use notification::{BroadcastBus, Notification, NotificationBus, NotificationKind, NullBus};
pub use registry::InviteRegistry;
pub use types::{
    Event, EventId, Identity, Invite, InviteStatus, RegistryConfig, TokenId, TransferPolicy,
};
