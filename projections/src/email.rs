//! Invite email delivery behind an async trait.
//!
//! The registry never blocks on email: a dispatcher task consumes mint
//! notifications off the bus and hands fully resolved invite data to an
//! [`EmailSender`]. The bundled [`ConsoleEmailSender`] prints to the log for
//! demo and development use; production deployments swap in a real provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inviteme_core::notification::{Notification, NotificationKind};
use inviteme_core::registry::InviteRegistry;
use inviteme_core::types::TokenId;
use inviteme_runtime::Store;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

/// Everything a provider needs to render one invite email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InviteEmailData {
    /// Recipient address or identity
    pub to: String,
    /// Name of the event the invite belongs to
    pub event_name: String,
    /// When the event takes place
    pub event_date: DateTime<Utc>,
    /// Where the event takes place
    pub event_location: String,
    /// Deep link to the invite
    pub invite_url: String,
}

/// Provider acknowledgement for one delivered email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider-assigned message id
    pub message_id: String,
}

/// Email delivery failure.
#[derive(Error, Debug)]
pub enum EmailError {
    /// The provider rejected or failed the delivery
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

/// Async seam for invite email delivery.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Delivers one invite email.
    ///
    /// # Errors
    ///
    /// [`EmailError::Delivery`] when the underlying provider fails.
    async fn send_invite(&self, data: &InviteEmailData) -> Result<DeliveryReceipt, EmailError>;
}

/// Console email sender (prints to the log for demo purposes).
///
/// Always succeeds and returns a `stub_` message id unique within the
/// process.
#[derive(Debug, Default)]
pub struct ConsoleEmailSender {
    sequence: AtomicU64,
}

impl ConsoleEmailSender {
    /// Creates a console sender
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl EmailSender for ConsoleEmailSender {
    async fn send_invite(&self, data: &InviteEmailData) -> Result<DeliveryReceipt, EmailError> {
        info!(
            "\n\n\
            ┌────────────────────────────────────────────────────────────────┐\n\
            │                      You're Invited!                           │\n\
            ├────────────────────────────────────────────────────────────────┤\n\
            │ To: {:<58} │\n\
            │                                                                │\n\
            │ {} \n\
            │ {} at {} \n\
            │                                                                │\n\
            │ View your invite: {} \n\
            └────────────────────────────────────────────────────────────────┘\n",
            data.to,
            data.event_name,
            data.event_date.format("%Y-%m-%d %H:%M UTC"),
            data.event_location,
            data.invite_url,
        );
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(DeliveryReceipt {
            message_id: format!("stub_{}_{sequence}", Utc::now().timestamp_millis()),
        })
    }
}

/// Background dispatcher sending one email per minted invite.
pub struct EmailDispatcher {
    store: Store<InviteRegistry>,
    sender: Arc<dyn EmailSender>,
    base_url: String,
}

impl EmailDispatcher {
    /// Creates a dispatcher resolving invite data through `store` and
    /// building links under `base_url`
    #[must_use]
    pub fn new(
        store: Store<InviteRegistry>,
        sender: Arc<dyn EmailSender>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sender,
            base_url: base_url.into(),
        }
    }

    /// Spawns the dispatch loop. Delivery failures are logged and skipped;
    /// the task ends when the bus is dropped.
    pub fn spawn(self, mut receiver: broadcast::Receiver<Notification>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(notification) => self.handle(&notification).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "email dispatcher lagged, invites went unsent");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("email dispatcher stopped, bus closed");
        })
    }

    async fn handle(&self, notification: &Notification) {
        if notification.kind != NotificationKind::InviteMinted {
            return;
        }
        let Some(token_id) = notification.token_id else {
            return;
        };
        let Some(data) = self.resolve(token_id).await else {
            // The invite can be gone by the time a lagging dispatcher drains
            tracing::warn!(token_id = %token_id, "minted invite no longer resolvable");
            return;
        };
        match self.sender.send_invite(&data).await {
            Ok(receipt) => {
                tracing::debug!(token_id = %token_id, message_id = %receipt.message_id, "invite email sent");
            }
            Err(error) => {
                tracing::error!(token_id = %token_id, %error, "invite email failed");
            }
        }
    }

    async fn resolve(&self, token_id: TokenId) -> Option<InviteEmailData> {
        let base_url = self.base_url.clone();
        self.store
            .query(move |registry| {
                let invite = registry.invite(token_id).ok()?;
                let event = registry.event(invite.event_id).ok()?;
                Some(InviteEmailData {
                    to: invite.owner.to_string(),
                    event_name: event.name.clone(),
                    event_date: event.date,
                    event_location: event.location.clone(),
                    invite_url: format!("{base_url}/invite/{}", token_id.value()),
                })
            })
            .await
    }
}
