//! Domain types for the InviteMe registry.
//!
//! Value objects and entities: actor identities, monotonic entity ids, the
//! invite status state machine, and the `Event`/`Invite` records themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Opaque actor identifier (an address-like string).
///
/// Identities have no internal structure; role checks (`is host`, `is owner`)
/// are plain equality comparisons against stored fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from an address-like string
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a fresh, unique identity (test fixtures and demos)
    #[must_use]
    pub fn random() -> Self {
        Self(format!("0x{}", Uuid::new_v4().simple()))
    }

    /// Returns the underlying address string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event, assigned monotonically from 1 by the
/// registry that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    /// Wraps a raw event id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an invite token, assigned monotonically from 1
/// across the whole registry instance (global counter, not per-event).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(u64);

impl TokenId {
    /// Wraps a raw token id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Invite status
// ============================================================================

/// Lifecycle status of an invite.
///
/// Serialized as its ordinal (0-3) for wire compatibility with the contract
/// encoding. Transitions are monotonic:
///
/// ```text
/// Pending --rsvp(true)--> Accepted --check_in--> Attended   (terminal)
/// Pending --rsvp(false)-> Declined                          (terminal)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InviteStatus {
    /// Minted, no RSVP yet
    Pending = 0,
    /// Guest accepted the invitation
    Accepted = 1,
    /// Guest declined the invitation (terminal)
    Declined = 2,
    /// Guest was checked in by the host (terminal)
    Attended = 3,
}

impl InviteStatus {
    /// Returns true once no further transition exists out of this status
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Declined | Self::Attended)
    }

    /// Returns the ordinal wire encoding
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }
}

impl From<InviteStatus> for u8 {
    fn from(status: InviteStatus) -> Self {
        status.ordinal()
    }
}

impl TryFrom<u8> for InviteStatus {
    type Error = String;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        match ordinal {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Accepted),
            2 => Ok(Self::Declined),
            3 => Ok(Self::Attended),
            other => Err(format!("invalid invite status ordinal: {other}")),
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Declined => write!(f, "declined"),
            Self::Attended => write!(f, "attended"),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A hosted occasion with a capacity limit that invites are minted against.
///
/// Immutable after creation except for `minted_count`, which the registry
/// increments on every successful mint. Invariant: `minted_count <= max_capacity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Registry-assigned id, starting at 1
    pub id: EventId,
    /// The identity that created the event
    pub host: Identity,
    /// Event name (non-empty)
    pub name: String,
    /// Event location (non-empty)
    pub location: String,
    /// Event date; no enforced relation to creation time
    pub date: DateTime<Utc>,
    /// Upper bound on invites ever minted for this event
    pub max_capacity: u32,
    /// Private-event flag; stored as inert metadata, never enforced
    pub is_private: bool,
    /// Number of invites minted so far
    pub minted_count: u32,
}

impl Event {
    /// Invites still mintable before hitting `max_capacity`
    #[must_use]
    pub const fn remaining_capacity(&self) -> u32 {
        self.max_capacity - self.minted_count
    }

    /// Returns true once the event has minted up to capacity
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.minted_count == self.max_capacity
    }
}

/// A uniquely owned token representing one guest's invitation to one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Registry-assigned id, starting at 1, global across the instance
    pub token_id: TokenId,
    /// The event this invite was minted against
    pub event_id: EventId,
    /// Current holder; changes only via transfer
    pub owner: Identity,
    /// Lifecycle status
    pub status: InviteStatus,
    /// Set by the first RSVP, never cleared
    pub rsvp_date: Option<DateTime<Utc>>,
    /// Set by check-in, never cleared
    pub check_in_date: Option<DateTime<Utc>>,
    /// Opaque pointer to off-registry invite artwork/content
    pub metadata_uri: String,
}

// ============================================================================
// Configuration
// ============================================================================

/// Whether invites may still be transferred after reaching a terminal status.
///
/// The observed contract behavior never restricts transfer, so
/// [`Unrestricted`](TransferPolicy::Unrestricted) is the default; deployments
/// that want souvenir-style frozen tokens opt into
/// [`FrozenWhenTerminal`](TransferPolicy::FrozenWhenTerminal).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferPolicy {
    /// Transfers allowed in every status
    #[default]
    Unrestricted,
    /// Transfers rejected once the invite is `Declined` or `Attended`
    FrozenWhenTerminal,
}

/// Per-instance registry configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Transfer restriction for terminal invites
    pub transfer_policy: TransferPolicy,
}
