use crate::crypto::PublicKey;
use crate::domain::{Message, MessageKind, SignupLeaf};
use crate::error::{Error, ProtocolViolation};
use crate::poll::{PollProvider, ProcessingPhase};
use crate::state::{MaciState, ProcessingToken, SignupRegistry};
use crate::tests::{get_poll, get_poll_config, get_state, keypair};
use crate::types::{Fr, PollId};

fn publish_noise(state: &mut MaciState, poll_id: PollId, count: u64)
{
    let poll = state.poll_mut(poll_id).unwrap();
    for i in 0..count
    {
        let message = Message::new(MessageKind::Vote, [Fr::from(i + 1); 10]);
        poll.publish_message(message, keypair(100 + i).public_key).unwrap();
    }
    poll.merge_all_messages().unwrap();
}

/// The registry starts with the blank leaf and counts real signups only.
#[test]
fn registry_starts_blank()
{
    let mut registry = SignupRegistry::new().unwrap();
    assert_eq!(registry.state_leaves(), &[SignupLeaf::blank()]);
    assert_eq!(registry.num_signups(), 0);

    let index = registry.sign_up(keypair(2).public_key, Fr::from(100u64), Fr::from(1u64)).unwrap();
    assert_eq!(index, 1);
    assert_eq!(registry.num_signups(), 1);
    assert_eq!(registry.state_tree().next_index(), 2);
}

/// The state accumulator merges to the state tree root.
#[test]
fn merge_state_aq()
{
    let mut state = MaciState::new().unwrap();
    for seed in 0..30
    {
        state.sign_up(keypair(seed + 2).public_key, Fr::from(100u64), Fr::from(1u64)).unwrap();
    }

    state.merge_state_aq_sub_roots(1).unwrap();
    state.merge_state_aq_sub_roots(0).unwrap();
    let root = state.merge_state_aq().unwrap();

    assert_eq!(root, state.registry().state_tree().root());
}

/// Poll ids are handed out in order, null polls included.
#[test]
fn deploy_polls()
{
    let mut state = MaciState::new().unwrap();
    assert_eq!(state.deploy_null_poll().unwrap(), 0);

    let mut config = get_poll_config();
    config.batch_sizes.tally_batch_size = 125;
    assert_eq!(state.deploy_poll(config).unwrap(), 1);

    assert!(matches!(state.poll(0), Err(Error::ProtocolViolation(ProtocolViolation::NullPoll(0)))));
    assert!(matches!(state.poll(2), Err(Error::ProtocolViolation(ProtocolViolation::UnknownPoll(2)))));
    assert_eq!(state.poll(1).unwrap().config().batch_sizes.tally_batch_size, 5);
    assert_eq!(state.num_polls(), 2);
}

/// Only one poll may hold the processing token.
#[test]
fn token_transitions()
{
    let mut token = ProcessingToken::default();
    assert!(token.is_idle());

    token.acquire(3).unwrap();
    token.acquire(3).unwrap();
    token.ensure_held(3).unwrap();

    assert!(matches!(
        token.acquire(4),
        Err(Error::ProtocolViolation(ProtocolViolation::PollBusy { active: 3, requested: 4 }))
    ));
    assert!(matches!(token.ensure_held(4), Err(Error::ProtocolViolation(ProtocolViolation::TokenNotHeld(4)))));

    token.release(4);
    assert_eq!(token, ProcessingToken::Processing(3));
    token.release(3);
    assert!(token.is_idle());
}

/// A second poll cannot start while the first is mid-processing.
#[test]
fn single_writer()
{
    let (mut state, first) = get_state(&[keypair(2)]);
    let second = state.deploy_poll_with(|poll_id| Ok(get_poll(poll_id))).unwrap();

    publish_noise(&mut state, first, 6);
    publish_noise(&mut state, second, 1);

    state.process_messages(first).unwrap();
    assert_eq!(state.processing(), ProcessingToken::Processing(first));
    assert!(matches!(state.poll(first).unwrap().phase(), ProcessingPhase::InProgress { cursor: 0 }));

    assert!(matches!(
        state.process_messages(second),
        Err(Error::ProtocolViolation(ProtocolViolation::PollBusy { .. }))
    ));
    assert!(state.poll(second).unwrap().snapshot().is_none());

    state.process_messages(first).unwrap();
    assert_eq!(state.poll(first).unwrap().phase(), ProcessingPhase::Sealed);
    assert!(state.processing().is_idle());

    state.process_messages(second).unwrap();
    assert!(state.processing().is_idle());
}

/// Signups made after a poll's snapshot never reach it.
#[test]
fn snapshot_is_taken_once()
{
    let (mut state, poll_id) = get_state(&[keypair(2)]);
    publish_noise(&mut state, poll_id, 6);

    state.process_messages(poll_id).unwrap();
    state.sign_up(keypair(3).public_key, Fr::from(5u64), Fr::from(2u64)).unwrap();
    state.process_messages(poll_id).unwrap();

    let poll = state.poll(poll_id).unwrap();
    assert_eq!(poll.state_leaves().len(), 2);
    assert_eq!(poll.ballots().len(), 2);
    assert_eq!(state.registry().state_leaves().len(), 3);
}

/// Copies compare equal until they diverge.
#[test]
fn clone_and_equality()
{
    let (mut state, poll_id) = get_state(&[keypair(2)]);
    let copy = state.clone();
    assert_eq!(copy, state);

    state.poll_mut(poll_id).unwrap().topup_message(Message::new(MessageKind::TopUp, [Fr::from(1u64); 10])).unwrap();
    assert!(copy != state);
    assert_eq!(state.poll(poll_id).unwrap().enc_pub_keys(), &[PublicKey::pad_key()]);
}
