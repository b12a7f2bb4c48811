//! Domain notifications emitted on every committed state change.
//!
//! The persistence mirror, email dispatch, and UI consume the registry purely
//! through this channel. The contract is deliberately narrow: one record per
//! committed transaction step, emitted in commit order, after every mutation
//! of that transaction has been applied. Delivery guarantees beyond that are
//! the subscriber's concern.

use crate::types::{EventId, Identity, TokenId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What happened in a committed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A new event was created
    EventCreated,
    /// An invite was minted (one per token, including batch mints)
    InviteMinted,
    /// A guest responded to an invite
    InviteRsvped,
    /// A host checked a guest in
    InviteCheckedIn,
    /// An invite changed owner
    InviteTransferred,
}

/// Record of one committed state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// The kind of transition that committed
    pub kind: NotificationKind,
    /// The event the transition belongs to
    pub event_id: EventId,
    /// The token involved, absent for `EventCreated`
    pub token_id: Option<TokenId>,
    /// The caller whose operation committed
    pub actor: Identity,
    /// Commit timestamp (from the registry's clock)
    pub timestamp: DateTime<Utc>,
}

/// Sink for committed-transaction notifications.
///
/// Emission happens synchronously inside the committing operation, while the
/// single-writer lock is still held, which is what makes "exactly once, in
/// commit order" hold without any coordination in the implementations.
pub trait NotificationBus: Send + Sync {
    /// Deliver one committed notification to subscribers
    fn emit(&self, notification: &Notification);
}

/// Fan-out bus backed by a tokio broadcast channel.
///
/// Subscribers that lag past the channel capacity lose the oldest records
/// (`RecvError::Lagged`); projections handle that by rebuilding from the
/// mirror rather than by back-pressuring the registry.
#[derive(Clone, Debug)]
pub struct BroadcastBus {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastBus {
    /// Creates a bus buffering up to `capacity` undelivered notifications
    /// per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Opens a new subscription starting at the next emitted notification
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NotificationBus for BroadcastBus {
    fn emit(&self, notification: &Notification) {
        tracing::debug!(
            kind = ?notification.kind,
            event_id = %notification.event_id,
            token_id = ?notification.token_id.map(TokenId::value),
            actor = %notification.actor,
            "notification committed"
        );
        // Send fails only when no subscriber exists, which is fine: the
        // registry does not require anyone to be listening.
        let _ = self.sender.send(notification.clone());
    }
}

/// Bus that drops every notification. Used by detached instances and tests
/// that do not observe the stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBus;

impl NotificationBus for NullBus {
    fn emit(&self, _notification: &Notification) {}
}
