//! Error taxonomy for registry and factory operations.
//!
//! Every failure is synchronous and pre-commit: a rejected operation performs
//! zero mutation. Each variant maps to one of four stable kinds so callers
//! (the API layer) can translate without parsing messages, while the messages
//! themselves stay human-readable.

use crate::types::{EventId, TokenId};
use thiserror::Error;

/// Stable classification of a [`RegistryError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed, empty, or out-of-range input
    Validation,
    /// Unknown event, token, or instance
    NotFound,
    /// Caller is not the host/owner the operation requires
    Authorization,
    /// Operation invalid for the current lifecycle state
    State,
}

/// Errors returned by [`InviteRegistry`](crate::registry::InviteRegistry) and
/// [`RegistryFactory`](crate::factory::RegistryFactory) operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A required text field was empty
    #[error("{field} cannot be empty")]
    EmptyField {
        /// Name of the offending field
        field: &'static str,
    },

    /// `max_capacity` must be positive
    #[error("max capacity must be greater than zero")]
    NonPositiveCapacity,

    /// Batch guest and metadata arrays must be the same length
    #[error("batch length mismatch: {guests} guests, {metadata_uris} metadata URIs")]
    BatchLengthMismatch {
        /// Number of guest identities supplied
        guests: usize,
        /// Number of metadata URIs supplied
        metadata_uris: usize,
    },

    /// No event exists under this id
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// No invite has been minted under this token id
    #[error("invite {0} not found")]
    InviteNotFound(TokenId),

    /// Single-contract mode has never been enabled
    #[error("no active registry instance")]
    NoActiveInstance,

    /// Caller is not the event's host
    #[error("Not the host")]
    NotHost,

    /// Caller is not the invite's current owner
    #[error("Not the invitee")]
    NotInvitee,

    /// The invite already left the `Pending` state
    #[error("Already responded")]
    AlreadyResponded,

    /// Check-in requires an accepted RSVP
    #[error("Must RSVP first")]
    MustRsvpFirst,

    /// The invite already has a check-in date
    #[error("Already checked in")]
    AlreadyCheckedIn,

    /// Minting would exceed the event's capacity
    #[error("event {event_id} capacity exceeded: {minted} minted of {max_capacity}, {requested} requested")]
    CapacityExceeded {
        /// The event whose capacity would be exceeded
        event_id: EventId,
        /// Invites already minted
        minted: u32,
        /// The event's capacity bound
        max_capacity: u32,
        /// Invites the rejected operation asked for
        requested: u32,
    },

    /// Transfer rejected by [`TransferPolicy::FrozenWhenTerminal`](crate::types::TransferPolicy)
    #[error("invite {0} is frozen in a terminal status")]
    TransferFrozen(TokenId),
}

impl RegistryError {
    /// Returns the stable kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyField { .. }
            | Self::NonPositiveCapacity
            | Self::BatchLengthMismatch { .. } => ErrorKind::Validation,
            Self::EventNotFound(_) | Self::InviteNotFound(_) | Self::NoActiveInstance => {
                ErrorKind::NotFound
            }
            Self::NotHost | Self::NotInvitee => ErrorKind::Authorization,
            Self::AlreadyResponded
            | Self::MustRsvpFirst
            | Self::AlreadyCheckedIn
            | Self::CapacityExceeded { .. }
            | Self::TransferFrozen(_) => ErrorKind::State,
        }
    }
}

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, RegistryError>;
