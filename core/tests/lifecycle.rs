//! Full invite lifecycle scenarios: create, mint, RSVP, check in, transfer.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use inviteme_core::{
    ErrorKind, EventId, Identity, InviteRegistry, InviteStatus, NotificationKind, RegistryError,
    TokenId,
};
use inviteme_testing::fixtures::{birthday_party, guest, host, stranger};
use inviteme_testing::mocks::test_env;
use inviteme_testing::ScenarioTest;

fn party_date() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::days(7)
}

// ============================================================================
// Event creation
// ============================================================================

#[test]
fn creating_an_event_assigns_ids_from_one() {
    let (env, _) = test_env();
    let mut registry = InviteRegistry::new(env);

    let first = registry
        .create_event(&host(), "Launch", party_date(), "HQ", 100, false)
        .unwrap();
    let second = registry
        .create_event(&host(), "After Party", party_date(), "Bar", 30, true)
        .unwrap();

    assert_eq!(first, EventId::new(1));
    assert_eq!(second, EventId::new(2));
    assert_eq!(registry.event_count(), 2);
    assert_eq!(registry.host_events(&host()), &[first, second]);
}

#[test]
fn created_event_stores_every_field() {
    ScenarioTest::new(test_env().0)
        .when(|registry| {
            registry.create_event(&host(), "Birthday Party", Utc::now(), "123 Main St", 50, true)
        })
        .then_ok(|event_id| assert_eq!(event_id, EventId::new(1)))
        .then_state(|registry| {
            let event = registry.event(EventId::new(1)).unwrap();
            assert_eq!(event.host, host());
            assert_eq!(event.name, "Birthday Party");
            assert_eq!(event.location, "123 Main St");
            assert_eq!(event.max_capacity, 50);
            assert!(event.is_private);
            assert_eq!(event.minted_count, 0);
        })
        .run();
}

#[test]
fn event_creation_rejects_blank_fields_and_zero_capacity() {
    for (name, location, capacity) in [("", "Loc", 10), ("Party", "", 10), ("Party", "Loc", 0)] {
        ScenarioTest::new(test_env().0)
            .when(move |registry| {
                registry.create_event(&host(), name, Utc::now(), location, capacity, false)
            })
            .then_err(|error| assert_eq!(error.kind(), ErrorKind::Validation))
            .then_state(|registry| assert_eq!(registry.event_count(), 0))
            .run();
    }
}

// ============================================================================
// Minting
// ============================================================================

#[test]
fn minting_assigns_ownership_and_counts_capacity() {
    ScenarioTest::new(test_env().0)
        .given(|registry| {
            birthday_party(registry);
        })
        .when(|registry| registry.mint_invite(&host(), EventId::new(1), &guest(), "ipfs://inv/1"))
        .then_ok(|token_id| assert_eq!(token_id, TokenId::new(1)))
        .then_state(|registry| {
            let invite = registry.invite(TokenId::new(1)).unwrap();
            assert_eq!(invite.owner, guest());
            assert_eq!(invite.status, InviteStatus::Pending);
            assert_eq!(invite.metadata_uri, "ipfs://inv/1");
            assert_eq!(invite.rsvp_date, None);
            assert_eq!(registry.owner_of(TokenId::new(1)).unwrap(), &guest());
            assert_eq!(registry.event(EventId::new(1)).unwrap().minted_count, 1);
        })
        .run();
}

#[test]
fn only_the_host_mints() {
    ScenarioTest::new(test_env().0)
        .given(|registry| {
            birthday_party(registry);
        })
        .when(|registry| registry.mint_invite(&stranger(), EventId::new(1), &guest(), "ipfs://1"))
        .then_err(|error| {
            assert_eq!(*error, RegistryError::NotHost);
            assert_eq!(error.to_string(), "Not the host");
            assert_eq!(error.kind(), ErrorKind::Authorization);
        })
        .run();
}

#[test]
fn minting_against_an_unknown_event_fails() {
    ScenarioTest::new(test_env().0)
        .when(|registry| registry.mint_invite(&host(), EventId::new(9), &guest(), "ipfs://1"))
        .then_err(|error| assert_eq!(error.kind(), ErrorKind::NotFound))
        .run();
}

#[test]
fn minting_stops_at_capacity() {
    let (env, _) = test_env();
    let mut registry = InviteRegistry::new(env);
    let event_id = registry
        .create_event(&host(), "Tiny", party_date(), "Loc", 2, false)
        .unwrap();

    registry.mint_invite(&host(), event_id, &guest(), "ipfs://1").unwrap();
    registry.mint_invite(&host(), event_id, &stranger(), "ipfs://2").unwrap();

    let error = registry
        .mint_invite(&host(), event_id, &Identity::new("0xlate"), "ipfs://3")
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::State);
    assert_eq!(registry.event(event_id).unwrap().minted_count, 2);
}

// ============================================================================
// Batch minting
// ============================================================================

#[test]
fn batch_mint_assigns_consecutive_tokens_in_input_order() {
    let (env, _) = test_env();
    let mut registry = InviteRegistry::new(env);
    let event_id = birthday_party(&mut registry);

    let guests = vec![guest(), stranger(), Identity::new("0xthird")];
    let uris = vec!["ipfs://1".to_string(), "ipfs://2".to_string(), "ipfs://3".to_string()];
    let tokens = registry
        .batch_mint_invites(&host(), event_id, &guests, &uris)
        .unwrap();

    assert_eq!(tokens, vec![TokenId::new(1), TokenId::new(2), TokenId::new(3)]);
    for (token_id, owner) in tokens.iter().zip(&guests) {
        assert_eq!(registry.owner_of(*token_id).unwrap(), owner);
    }
    assert_eq!(registry.event(event_id).unwrap().minted_count, 3);
}

#[test]
fn batch_mint_is_atomic_over_capacity() {
    let (env, bus) = test_env();
    let mut registry = InviteRegistry::new(env);
    let event_id = registry
        .create_event(&host(), "Tiny", party_date(), "Loc", 2, false)
        .unwrap();
    registry.mint_invite(&host(), event_id, &guest(), "ipfs://1").unwrap();
    let emitted_before = bus.len();

    let guests = vec![stranger(), Identity::new("0xthird")];
    let uris = vec!["ipfs://2".to_string(), "ipfs://3".to_string()];
    let error = registry
        .batch_mint_invites(&host(), event_id, &guests, &uris)
        .unwrap_err();

    // Nothing minted, nothing emitted, counter series unbroken
    assert_eq!(error.kind(), ErrorKind::State);
    assert_eq!(registry.event(event_id).unwrap().minted_count, 1);
    assert_eq!(bus.len(), emitted_before);
    let next = registry
        .mint_invite(&host(), event_id, &stranger(), "ipfs://2")
        .unwrap();
    assert_eq!(next, TokenId::new(2));
}

#[test]
fn batch_mint_rejects_mismatched_inputs() {
    ScenarioTest::new(test_env().0)
        .given(|registry| {
            birthday_party(registry);
        })
        .when(|registry| {
            registry.batch_mint_invites(
                &host(),
                EventId::new(1),
                &[guest(), stranger()],
                &["ipfs://1".to_string()],
            )
        })
        .then_err(|error| assert_eq!(error.kind(), ErrorKind::Validation))
        .run();
}

// ============================================================================
// RSVP
// ============================================================================

fn minted_registry() -> (InviteRegistry, EventId, TokenId) {
    let (env, _) = test_env();
    let mut registry = InviteRegistry::new(env);
    let event_id = birthday_party(&mut registry);
    let token_id = registry
        .mint_invite(&host(), event_id, &guest(), "ipfs://1")
        .unwrap();
    (registry, event_id, token_id)
}

#[test]
fn accepting_records_status_and_date() {
    let (mut registry, _, token_id) = minted_registry();
    registry.rsvp(&guest(), token_id, true).unwrap();

    let invite = registry.invite(token_id).unwrap();
    assert_eq!(invite.status, InviteStatus::Accepted);
    assert!(invite.rsvp_date.is_some());
    assert_eq!(invite.check_in_date, None);
}

#[test]
fn declining_is_terminal() {
    let (mut registry, _, token_id) = minted_registry();
    registry.rsvp(&guest(), token_id, false).unwrap();
    assert_eq!(registry.invite(token_id).unwrap().status, InviteStatus::Declined);

    let error = registry.rsvp(&guest(), token_id, true).unwrap_err();
    assert_eq!(error, RegistryError::AlreadyResponded);
    assert_eq!(error.to_string(), "Already responded");
}

#[test]
fn only_the_invitee_responds() {
    let (mut registry, _, token_id) = minted_registry();
    let error = registry.rsvp(&stranger(), token_id, true).unwrap_err();
    assert_eq!(error, RegistryError::NotInvitee);
    assert_eq!(error.to_string(), "Not the invitee");
    assert_eq!(registry.invite(token_id).unwrap().status, InviteStatus::Pending);
}

#[test]
fn responding_twice_fails_even_with_the_same_answer() {
    let (mut registry, _, token_id) = minted_registry();
    registry.rsvp(&guest(), token_id, true).unwrap();
    assert_eq!(
        registry.rsvp(&guest(), token_id, true).unwrap_err(),
        RegistryError::AlreadyResponded
    );
}

// ============================================================================
// Check-in
// ============================================================================

#[test]
fn host_checks_in_an_accepted_guest() {
    let (mut registry, _, token_id) = minted_registry();
    registry.rsvp(&guest(), token_id, true).unwrap();
    registry.check_in(&host(), token_id).unwrap();

    let invite = registry.invite(token_id).unwrap();
    assert_eq!(invite.status, InviteStatus::Attended);
    assert!(invite.check_in_date.is_some());
}

#[test]
fn guests_cannot_check_themselves_in() {
    let (mut registry, _, token_id) = minted_registry();
    registry.rsvp(&guest(), token_id, true).unwrap();

    let error = registry.check_in(&guest(), token_id).unwrap_err();
    assert_eq!(error, RegistryError::NotHost);
    assert_eq!(registry.invite(token_id).unwrap().status, InviteStatus::Accepted);
}

#[test]
fn check_in_requires_an_accepted_rsvp() {
    let (mut registry, _, token_id) = minted_registry();
    let error = registry.check_in(&host(), token_id).unwrap_err();
    assert_eq!(error, RegistryError::MustRsvpFirst);
    assert_eq!(error.to_string(), "Must RSVP first");
}

#[test]
fn declined_guests_cannot_be_checked_in() {
    let (mut registry, _, token_id) = minted_registry();
    registry.rsvp(&guest(), token_id, false).unwrap();
    assert_eq!(
        registry.check_in(&host(), token_id).unwrap_err(),
        RegistryError::MustRsvpFirst
    );
}

#[test]
fn repeated_check_in_fails() {
    let (mut registry, _, token_id) = minted_registry();
    registry.rsvp(&guest(), token_id, true).unwrap();
    registry.check_in(&host(), token_id).unwrap();

    let error = registry.check_in(&host(), token_id).unwrap_err();
    assert_eq!(error, RegistryError::AlreadyCheckedIn);
    assert_eq!(error.to_string(), "Already checked in");
}

// ============================================================================
// Transfer
// ============================================================================

#[test]
fn transfer_moves_ownership_and_keeps_status() {
    let (mut registry, _, token_id) = minted_registry();
    registry.rsvp(&guest(), token_id, true).unwrap();

    let new_owner = Identity::new("0xnew");
    registry.transfer_invite(&guest(), token_id, &new_owner).unwrap();

    let invite = registry.invite(token_id).unwrap();
    assert_eq!(invite.owner, new_owner);
    assert_eq!(invite.status, InviteStatus::Accepted);
    // The previous owner lost all rights over the token
    assert_eq!(
        registry.transfer_invite(&guest(), token_id, &guest()).unwrap_err(),
        RegistryError::NotInvitee
    );
    registry.transfer_invite(&new_owner, token_id, &guest()).unwrap();
}

#[test]
fn only_the_owner_transfers() {
    let (mut registry, _, token_id) = minted_registry();
    let error = registry
        .transfer_invite(&stranger(), token_id, &stranger())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Authorization);
    assert_eq!(registry.owner_of(token_id).unwrap(), &guest());
}

// ============================================================================
// Notification stream
// ============================================================================

#[test]
fn committed_operations_notify_in_commit_order() {
    let (env, bus) = test_env();
    let mut registry = InviteRegistry::new(env);
    let event_id = birthday_party(&mut registry);
    let token_id = registry
        .mint_invite(&host(), event_id, &guest(), "ipfs://1")
        .unwrap();
    registry.rsvp(&guest(), token_id, true).unwrap();
    registry.check_in(&host(), token_id).unwrap();
    // A rejected operation leaves no trace on the stream
    registry.transfer_invite(&stranger(), token_id, &stranger()).unwrap_err();

    assert_eq!(
        bus.kinds(),
        vec![
            NotificationKind::EventCreated,
            NotificationKind::InviteMinted,
            NotificationKind::InviteRsvped,
            NotificationKind::InviteCheckedIn,
        ]
    );
}

#[test]
fn batch_mint_notifies_once_per_token() {
    let (env, bus) = test_env();
    let mut registry = InviteRegistry::new(env);
    let event_id = birthday_party(&mut registry);

    registry
        .batch_mint_invites(
            &host(),
            event_id,
            &[guest(), stranger()],
            &["ipfs://1".to_string(), "ipfs://2".to_string()],
        )
        .unwrap();

    let minted: Vec<_> = bus
        .notifications()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::InviteMinted)
        .collect();
    assert_eq!(minted.len(), 2);
    assert_eq!(minted[0].token_id, Some(TokenId::new(1)));
    assert_eq!(minted[1].token_id, Some(TokenId::new(2)));
}
