//! The invite token registry.
//!
//! One `InviteRegistry` is a self-contained store of events and invites with
//! its own monotonic id counters. Every mutating operation is a transaction:
//! all invariant checks run first against the current state, and only when
//! every check passes are the mutations applied and the notifications
//! emitted. A rejected operation performs zero mutation.

use crate::environment::RegistryEnvironment;
use crate::error::{RegistryError, Result};
use crate::notification::{Notification, NotificationKind};
use crate::types::{
    Event, EventId, Identity, Invite, InviteStatus, RegistryConfig, TokenId, TransferPolicy,
};
use chrono::{DateTime, Utc};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

/// Staged notifications for one transaction; batches rarely exceed a handful
/// of tokens, so this usually stays on the stack.
type Staged = SmallVec<[Notification; 4]>;

/// A self-contained registry of events and invite tokens.
///
/// Single-writer by construction: all mutating operations take `&mut self`,
/// so callers that need concurrent access serialize through
/// `inviteme_runtime::Store`.
pub struct InviteRegistry {
    env: RegistryEnvironment,
    config: RegistryConfig,
    /// Events assigned so far; the next event gets `event_counter + 1`
    event_counter: u64,
    /// Tokens assigned so far, global across all events of this instance
    token_counter: u64,
    events: BTreeMap<EventId, Event>,
    invites: BTreeMap<TokenId, Invite>,
    /// Host identity -> event ids they created, in creation order
    host_index: HashMap<Identity, Vec<EventId>>,
}

impl InviteRegistry {
    /// Creates an empty registry with the default configuration
    #[must_use]
    pub fn new(env: RegistryEnvironment) -> Self {
        Self::with_config(env, RegistryConfig::default())
    }

    /// Creates an empty registry with an explicit configuration
    #[must_use]
    pub fn with_config(env: RegistryEnvironment, config: RegistryConfig) -> Self {
        Self {
            env,
            config,
            event_counter: 0,
            token_counter: 0,
            events: BTreeMap::new(),
            invites: BTreeMap::new(),
            host_index: HashMap::new(),
        }
    }

    /// This instance's configuration
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ========================================================================
    // Mutating operations
    // ========================================================================

    /// Creates a new event hosted by `caller`.
    ///
    /// # Errors
    ///
    /// Validation errors for an empty `name`/`location` or a zero
    /// `max_capacity`.
    pub fn create_event(
        &mut self,
        caller: &Identity,
        name: impl Into<String>,
        date: DateTime<Utc>,
        location: impl Into<String>,
        max_capacity: u32,
        is_private: bool,
    ) -> Result<EventId> {
        let name = name.into();
        let location = location.into();

        // Validate
        if name.is_empty() {
            return Err(RegistryError::EmptyField { field: "name" });
        }
        if location.is_empty() {
            return Err(RegistryError::EmptyField { field: "location" });
        }
        if max_capacity == 0 {
            return Err(RegistryError::NonPositiveCapacity);
        }

        // Commit
        let now = self.env.clock.now();
        let id = EventId::new(self.event_counter + 1);
        self.event_counter += 1;
        self.events.insert(
            id,
            Event {
                id,
                host: caller.clone(),
                name,
                location,
                date,
                max_capacity,
                is_private,
                minted_count: 0,
            },
        );
        self.host_index.entry(caller.clone()).or_default().push(id);

        tracing::info!(event_id = %id, host = %caller, "event created");
        self.emit(&[Notification {
            kind: NotificationKind::EventCreated,
            event_id: id,
            token_id: None,
            actor: caller.clone(),
            timestamp: now,
        }]);
        Ok(id)
    }

    /// Mints one invite for `guest` against an existing event.
    ///
    /// # Errors
    ///
    /// Not-found for an unknown event, authorization unless `caller` is the
    /// host, and a capacity error once `minted_count == max_capacity`.
    pub fn mint_invite(
        &mut self,
        caller: &Identity,
        event_id: EventId,
        guest: &Identity,
        metadata_uri: impl Into<String>,
    ) -> Result<TokenId> {
        self.validate_mint(caller, event_id, 1)?;

        let now = self.env.clock.now();
        let mut staged = Staged::new();
        let token_id = self.commit_mint(event_id, guest, metadata_uri.into(), now, &mut staged);
        self.emit(&staged);
        Ok(token_id)
    }

    /// Mints one invite per guest, atomically.
    ///
    /// Tokens are assigned in input order with consecutive ids drawn from the
    /// same counter series as [`mint_invite`](Self::mint_invite). Capacity is
    /// checked against the whole batch: if it does not fit, nothing is minted.
    ///
    /// # Errors
    ///
    /// As [`mint_invite`](Self::mint_invite), plus a validation error when
    /// `guests` and `metadata_uris` differ in length.
    pub fn batch_mint_invites(
        &mut self,
        caller: &Identity,
        event_id: EventId,
        guests: &[Identity],
        metadata_uris: &[String],
    ) -> Result<Vec<TokenId>> {
        // Validate the whole batch before touching anything
        if guests.len() != metadata_uris.len() {
            return Err(RegistryError::BatchLengthMismatch {
                guests: guests.len(),
                metadata_uris: metadata_uris.len(),
            });
        }
        let requested = u32::try_from(guests.len())
            .map_err(|_| RegistryError::BatchLengthMismatch {
                guests: guests.len(),
                metadata_uris: metadata_uris.len(),
            })?;
        self.validate_mint(caller, event_id, requested)?;

        // Commit
        let now = self.env.clock.now();
        let mut staged = Staged::new();
        let token_ids = guests
            .iter()
            .zip(metadata_uris)
            .map(|(guest, uri)| self.commit_mint(event_id, guest, uri.clone(), now, &mut staged))
            .collect();
        self.emit(&staged);
        Ok(token_ids)
    }

    /// Records the owner's RSVP. `accepted == true` moves the invite to
    /// `Accepted`, otherwise to the terminal `Declined`.
    ///
    /// # Errors
    ///
    /// Not-found for an unknown token, authorization unless `caller` owns the
    /// invite, and a state error once the invite already left `Pending`.
    pub fn rsvp(&mut self, caller: &Identity, token_id: TokenId, accepted: bool) -> Result<()> {
        let invite = self
            .invites
            .get(&token_id)
            .ok_or(RegistryError::InviteNotFound(token_id))?;
        if invite.owner != *caller {
            return Err(RegistryError::NotInvitee);
        }
        if invite.status != InviteStatus::Pending {
            return Err(RegistryError::AlreadyResponded);
        }
        let event_id = invite.event_id;

        let now = self.env.clock.now();
        if let Some(invite) = self.invites.get_mut(&token_id) {
            invite.status = if accepted {
                InviteStatus::Accepted
            } else {
                InviteStatus::Declined
            };
            invite.rsvp_date = Some(now);
        }

        self.emit(&[Notification {
            kind: NotificationKind::InviteRsvped,
            event_id,
            token_id: Some(token_id),
            actor: caller.clone(),
            timestamp: now,
        }]);
        Ok(())
    }

    /// Checks the guest in; host-only, requires an accepted RSVP.
    ///
    /// # Errors
    ///
    /// Not-found for an unknown token, authorization unless `caller` hosts the
    /// invite's event, and state errors for a missing RSVP or a repeated
    /// check-in.
    pub fn check_in(&mut self, caller: &Identity, token_id: TokenId) -> Result<()> {
        let invite = self
            .invites
            .get(&token_id)
            .ok_or(RegistryError::InviteNotFound(token_id))?;
        let event = self
            .events
            .get(&invite.event_id)
            .ok_or(RegistryError::EventNotFound(invite.event_id))?;
        if event.host != *caller {
            return Err(RegistryError::NotHost);
        }
        // Checked-in invites are Attended, which would also fail the status
        // check below; test the date first so the repeat case reports itself.
        if invite.check_in_date.is_some() {
            return Err(RegistryError::AlreadyCheckedIn);
        }
        if invite.status != InviteStatus::Accepted {
            return Err(RegistryError::MustRsvpFirst);
        }
        let event_id = invite.event_id;

        let now = self.env.clock.now();
        if let Some(invite) = self.invites.get_mut(&token_id) {
            invite.status = InviteStatus::Attended;
            invite.check_in_date = Some(now);
        }

        self.emit(&[Notification {
            kind: NotificationKind::InviteCheckedIn,
            event_id,
            token_id: Some(token_id),
            actor: caller.clone(),
            timestamp: now,
        }]);
        Ok(())
    }

    /// Transfers the invite to `new_owner`, leaving status and dates intact.
    ///
    /// # Errors
    ///
    /// Not-found for an unknown token, authorization unless `caller` owns the
    /// invite, and a state error when the configured
    /// [`TransferPolicy`] freezes terminal invites.
    pub fn transfer_invite(
        &mut self,
        caller: &Identity,
        token_id: TokenId,
        new_owner: &Identity,
    ) -> Result<()> {
        let invite = self
            .invites
            .get(&token_id)
            .ok_or(RegistryError::InviteNotFound(token_id))?;
        if invite.owner != *caller {
            return Err(RegistryError::NotInvitee);
        }
        if self.config.transfer_policy == TransferPolicy::FrozenWhenTerminal
            && invite.status.is_terminal()
        {
            return Err(RegistryError::TransferFrozen(token_id));
        }
        let event_id = invite.event_id;

        let now = self.env.clock.now();
        if let Some(invite) = self.invites.get_mut(&token_id) {
            invite.owner = new_owner.clone();
        }

        self.emit(&[Notification {
            kind: NotificationKind::InviteTransferred,
            event_id,
            token_id: Some(token_id),
            actor: caller.clone(),
            timestamp: now,
        }]);
        Ok(())
    }

    // ========================================================================
    // Read-only lookups
    // ========================================================================

    /// Looks up an event by id.
    ///
    /// # Errors
    ///
    /// Not-found if no event exists under `event_id`.
    pub fn event(&self, event_id: EventId) -> Result<&Event> {
        self.events
            .get(&event_id)
            .ok_or(RegistryError::EventNotFound(event_id))
    }

    /// Looks up an invite by token id.
    ///
    /// # Errors
    ///
    /// Not-found if no invite has been minted under `token_id`.
    pub fn invite(&self, token_id: TokenId) -> Result<&Invite> {
        self.invites
            .get(&token_id)
            .ok_or(RegistryError::InviteNotFound(token_id))
    }

    /// Current owner of a minted token.
    ///
    /// # Errors
    ///
    /// Not-found if no invite has been minted under `token_id`.
    pub fn owner_of(&self, token_id: TokenId) -> Result<&Identity> {
        self.invite(token_id).map(|invite| &invite.owner)
    }

    /// Number of events created in this instance
    #[must_use]
    pub const fn event_count(&self) -> u64 {
        self.event_counter
    }

    /// Event ids created by `host`, in creation order. Empty for an unknown
    /// host; that is not an error.
    #[must_use]
    pub fn host_events(&self, host: &Identity) -> &[EventId] {
        self.host_index.get(host).map_or(&[], Vec::as_slice)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Shared checks for single and batch minting.
    fn validate_mint(&self, caller: &Identity, event_id: EventId, requested: u32) -> Result<()> {
        let event = self
            .events
            .get(&event_id)
            .ok_or(RegistryError::EventNotFound(event_id))?;
        if event.host != *caller {
            return Err(RegistryError::NotHost);
        }
        if event.minted_count + requested > event.max_capacity {
            return Err(RegistryError::CapacityExceeded {
                event_id,
                minted: event.minted_count,
                max_capacity: event.max_capacity,
                requested,
            });
        }
        Ok(())
    }

    /// Applies one mint that already passed validation and stages its
    /// notification. The actor of a mint is the host, recorded via the
    /// event's stored host rather than re-threading the caller.
    fn commit_mint(
        &mut self,
        event_id: EventId,
        guest: &Identity,
        metadata_uri: String,
        now: DateTime<Utc>,
        staged: &mut Staged,
    ) -> TokenId {
        let token_id = TokenId::new(self.token_counter + 1);
        self.token_counter += 1;
        self.invites.insert(
            token_id,
            Invite {
                token_id,
                event_id,
                owner: guest.clone(),
                status: InviteStatus::Pending,
                rsvp_date: None,
                check_in_date: None,
                metadata_uri,
            },
        );
        let actor = if let Some(event) = self.events.get_mut(&event_id) {
            event.minted_count += 1;
            event.host.clone()
        } else {
            guest.clone()
        };
        staged.push(Notification {
            kind: NotificationKind::InviteMinted,
            event_id,
            token_id: Some(token_id),
            actor,
            timestamp: now,
        });
        token_id
    }

    /// Emits staged notifications after every mutation of the transaction
    /// has been applied, preserving commit order.
    fn emit(&self, staged: &[Notification]) {
        for notification in staged {
            self.env.bus.emit(notification);
        }
    }
}

impl std::fmt::Debug for InviteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InviteRegistry")
            .field("event_counter", &self.event_counter)
            .field("token_counter", &self.token_counter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
