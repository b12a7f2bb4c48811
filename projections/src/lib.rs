//! # InviteMe Projections
//!
//! Read-side collaborators that consume the registry's committed-notification
//! stream instead of touching registry state:
//!
//! - [`analytics`] folds notifications into per-event engagement counters
//! - [`email`] sends one invite email per minted token through an async
//!   provider seam, with a console stub for development
//!
//! Both attach to a [`BroadcastBus`](inviteme_core::notification::BroadcastBus)
//! subscription and resolve extra detail through a read-only
//! [`Store`](inviteme_runtime::Store) handle. Because the registry emits
//! exactly once per committed transaction, in commit order, projections never
//! need deduplication; a lagged subscriber rebuilds rather than repairs.

pub mod analytics;
pub mod email;

pub use analytics::{spawn_analytics, AnalyticsProjection, EventAnalytics};
pub use email::{
    ConsoleEmailSender, DeliveryReceipt, EmailDispatcher, EmailError, EmailSender, InviteEmailData,
};
