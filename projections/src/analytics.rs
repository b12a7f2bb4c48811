//! Per-event engagement counters projected from the notification stream.
//!
//! This projection maintains aggregated engagement metrics, enabling fast
//! queries like "how many guests checked in to Event X?" without scanning
//! invites. It is derived state: dropping it and replaying the recorded
//! notification stream via [`AnalyticsProjection::rebuild`] reproduces the
//! same counters.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use inviteme_core::notification::{Notification, NotificationKind};
use inviteme_core::registry::InviteRegistry;
use inviteme_core::types::{EventId, InviteStatus};
use inviteme_runtime::Store;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

/// Engagement counters for a single event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAnalytics {
    /// Event these counters belong to
    pub event_id: EventId,
    /// Page/profile views, reported by the UI rather than the registry
    pub views: u64,
    /// RSVP responses of either kind
    pub rsvps: u64,
    /// RSVPs that accepted
    pub accepted: u64,
    /// RSVPs that declined
    pub declined: u64,
    /// Guests checked in at the door
    pub check_ins: u64,
    /// Invite ownership changes
    pub transfers: u64,
    /// Commit timestamp of the last notification folded in
    pub last_updated: Option<DateTime<Utc>>,
}

impl EventAnalytics {
    /// Fresh counters for an event
    #[must_use]
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            views: 0,
            rsvps: 0,
            accepted: 0,
            declined: 0,
            check_ins: 0,
            transfers: 0,
            last_updated: None,
        }
    }

    /// Fraction of accepted guests who checked in, if any accepted
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn check_in_rate(&self) -> Option<f64> {
        (self.accepted > 0).then(|| self.check_ins as f64 / self.accepted as f64)
    }
}

/// Projection folding committed notifications into per-event counters.
///
/// An RSVP notification does not carry the response, so [`apply`] takes the
/// invite's status as looked up by the caller; any non-declined status counts
/// as accepted, which stays correct after the guest later attends.
///
/// [`apply`]: AnalyticsProjection::apply
#[derive(Debug, Default)]
pub struct AnalyticsProjection {
    /// Counters indexed by `event_id`
    metrics: HashMap<EventId, EventAnalytics>,
}

impl AnalyticsProjection {
    /// Creates an empty projection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for a specific event
    #[must_use]
    pub fn metrics(&self, event_id: &EventId) -> Option<&EventAnalytics> {
        self.metrics.get(event_id)
    }

    /// Number of events with any recorded activity
    #[must_use]
    pub fn events_tracked(&self) -> usize {
        self.metrics.len()
    }

    /// RSVP responses across all events
    #[must_use]
    pub fn total_rsvps(&self) -> u64 {
        self.metrics.values().map(|m| m.rsvps).sum()
    }

    /// Check-ins across all events
    #[must_use]
    pub fn total_check_ins(&self) -> u64 {
        self.metrics.values().map(|m| m.check_ins).sum()
    }

    /// Records one UI view of an event. Views are not registry transactions,
    /// so they arrive through this call instead of the notification stream.
    pub fn record_view(&mut self, event_id: EventId) {
        self.get_or_create(event_id).views += 1;
    }

    /// Folds one committed notification into the counters.
    ///
    /// `invite_status` is the involved invite's current status; it is only
    /// consulted for RSVP notifications.
    pub fn apply(&mut self, notification: &Notification, invite_status: Option<InviteStatus>) {
        let row = self.get_or_create(notification.event_id);
        match notification.kind {
            // Creation and minting open the row; nothing to count yet
            NotificationKind::EventCreated | NotificationKind::InviteMinted => {}
            NotificationKind::InviteRsvped => {
                row.rsvps += 1;
                if invite_status == Some(InviteStatus::Declined) {
                    row.declined += 1;
                } else {
                    row.accepted += 1;
                }
            }
            NotificationKind::InviteCheckedIn => row.check_ins += 1,
            NotificationKind::InviteTransferred => row.transfers += 1,
        }
        row.last_updated = Some(notification.timestamp);
    }

    /// Rebuilds the counters by replaying a recorded notification stream
    /// against the registry's current state.
    pub fn rebuild<'a, I>(registry: &InviteRegistry, notifications: I) -> Self
    where
        I: IntoIterator<Item = &'a Notification>,
    {
        let mut projection = Self::new();
        for notification in notifications {
            let status = notification
                .token_id
                .and_then(|token_id| registry.invite(token_id).ok())
                .map(|invite| invite.status);
            projection.apply(notification, status);
        }
        projection
    }

    fn get_or_create(&mut self, event_id: EventId) -> &mut EventAnalytics {
        self.metrics
            .entry(event_id)
            .or_insert_with(|| EventAnalytics::new(event_id))
    }
}

/// Spawns a background task that drains a bus subscription into a shared
/// projection, resolving RSVP statuses through the store.
///
/// A lagged subscription is logged and skipped; a consumer that lagged should
/// rebuild from the recorded stream instead of trusting partial counters.
/// The task ends when the bus is dropped.
pub fn spawn_analytics(
    store: Store<InviteRegistry>,
    receiver: broadcast::Receiver<Notification>,
    projection: Arc<RwLock<AnalyticsProjection>>,
) -> JoinHandle<()> {
    let mut stream = BroadcastStream::new(receiver);
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(notification) => {
                    let status = store
                        .query(|registry| {
                            notification
                                .token_id
                                .and_then(|token_id| registry.invite(token_id).ok())
                                .map(|invite| invite.status)
                        })
                        .await;
                    projection.write().await.apply(&notification, status);
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "analytics subscription lagged, counters are partial");
                }
            }
        }
        tracing::debug!("analytics consumer stopped, bus closed");
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inviteme_core::environment::{Clock, RegistryEnvironment};
    use inviteme_core::notification::BroadcastBus;
    use inviteme_core::types::{Identity, TokenId};
    use inviteme_testing::fixtures::{birthday_party, guest, host, stranger};
    use inviteme_testing::mocks::{test_clock, test_env};
    use std::time::Duration;

    /// Registry with one event, two invites, one accept, one decline, one
    /// check-in and one transfer, plus the notifications that produced it.
    fn played_out_registry() -> (InviteRegistry, Vec<Notification>, EventId) {
        let (env, bus) = test_env();
        let mut registry = InviteRegistry::new(env);
        let event_id = birthday_party(&mut registry);
        let first = registry
            .mint_invite(&host(), event_id, &guest(), "ipfs://1")
            .unwrap();
        let second = registry
            .mint_invite(&host(), event_id, &stranger(), "ipfs://2")
            .unwrap();
        registry.rsvp(&guest(), first, true).unwrap();
        registry.rsvp(&stranger(), second, false).unwrap();
        registry.check_in(&host(), first).unwrap();
        registry
            .transfer_invite(&stranger(), second, &Identity::new("0xother"))
            .unwrap();
        (registry, bus.notifications(), event_id)
    }

    #[test]
    fn rebuild_folds_a_recorded_stream() {
        let (registry, notifications, event_id) = played_out_registry();
        let projection = AnalyticsProjection::rebuild(&registry, &notifications);

        let row = projection.metrics(&event_id).unwrap();
        assert_eq!(row.rsvps, 2);
        assert_eq!(row.accepted, 1);
        assert_eq!(row.declined, 1);
        assert_eq!(row.check_ins, 1);
        assert_eq!(row.transfers, 1);
        assert_eq!(row.views, 0);
        assert_eq!(row.last_updated, Some(test_clock().now()));
    }

    #[test]
    fn accepted_stays_accepted_after_attendance() {
        // The checked-in invite is Attended by replay time; its RSVP must
        // still classify as accepted.
        let (registry, notifications, _) = played_out_registry();
        assert_eq!(
            registry.invite(TokenId::new(1)).unwrap().status,
            InviteStatus::Attended
        );
        let projection = AnalyticsProjection::rebuild(&registry, &notifications);
        assert_eq!(projection.total_rsvps(), 2);
        assert_eq!(projection.metrics(&EventId::new(1)).unwrap().accepted, 1);
    }

    #[test]
    fn views_accumulate_outside_the_stream() {
        let mut projection = AnalyticsProjection::new();
        projection.record_view(EventId::new(7));
        projection.record_view(EventId::new(7));

        let row = projection.metrics(&EventId::new(7)).unwrap();
        assert_eq!(row.views, 2);
        assert_eq!(row.last_updated, None);
        assert_eq!(projection.events_tracked(), 1);
    }

    #[test]
    fn check_in_rate_needs_an_acceptance() {
        let mut row = EventAnalytics::new(EventId::new(1));
        assert_eq!(row.check_in_rate(), None);
        row.accepted = 4;
        row.check_ins = 1;
        assert_eq!(row.check_in_rate(), Some(0.25));
    }

    #[tokio::test]
    async fn live_consumer_tracks_store_mutations() {
        let bus = Arc::new(BroadcastBus::new(16));
        let env = RegistryEnvironment::new(Arc::new(test_clock()), bus.clone());
        let store = Store::new(InviteRegistry::new(env));
        let projection = Arc::new(RwLock::new(AnalyticsProjection::new()));
        let handle = spawn_analytics(store.clone(), bus.subscribe(), projection.clone());

        let event_id = store
            .execute(|registry| {
                let event_id = birthday_party(registry);
                let token_id = registry
                    .mint_invite(&host(), event_id, &guest(), "ipfs://1")
                    .unwrap();
                registry.rsvp(&guest(), token_id, true).unwrap();
                event_id
            })
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let done = projection
                    .read()
                    .await
                    .metrics(&event_id)
                    .is_some_and(|row| row.rsvps == 1 && row.accepted == 1);
                if done {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        handle.abort();
    }
}
