use num_bigint::BigUint;
use crate::crypto::{elgamal, Keypair, PublicKey};
use crate::domain::{Message, MessageKind};
use crate::error::{Error, InputError, ProtocolViolation};
use crate::hash::hash2;
use crate::poll::PollProvider;
use crate::state::MaciState;
use crate::tests::{encrypt_vote, get_coordinator, get_state, keypair, vote};
use crate::types::{Fr, PollId};

const SEED: u64 = 4242;

/// A deactivation request for `state_index`, signed by `signer`.
fn request(state: &mut MaciState, poll_id: PollId, state_index: u64, signer: &Keypair, salt: u64) -> (Message, PublicKey)
{
    let command = crate::domain::VoteCommand::new(
        state_index,
        PublicKey::pad_key(),
        0,
        0,
        0,
        poll_id.into(),
        Fr::from(salt)
    )
    .unwrap();
    let (message, enc_pub_key) = encrypt_vote(&command, signer, 300 + salt);
    state.poll_mut(poll_id).unwrap().deactivate_key(message.clone(), enc_pub_key).unwrap();
    (message, enc_pub_key)
}

/// A valid deactivation encrypts status one, and rerandomizing keeps it.
#[test]
fn deactivation_and_rerandomization()
{
    let voter = keypair(2);
    let (mut state, poll_id) = get_state(&[voter]);
    request(&mut state, poll_id, 1, &voter, 17);

    let output = state.process_deactivation_messages(poll_id, Fr::from(SEED)).unwrap();
    let coordinator = get_coordinator();
    let leaf = &output.deactivated_leaves[0];

    assert_eq!(leaf.public_key, voter.public_key);
    assert_eq!(leaf.salt, Fr::from(17u64));
    assert_eq!(elgamal::decrypt_bit(&coordinator.private_key, &leaf.ciphertext), Ok(true));

    let rerandomized = elgamal::rerandomize(&coordinator.public_key, &BigUint::from(8675309u32), &leaf.ciphertext);
    assert!(rerandomized != leaf.ciphertext);
    assert_eq!(elgamal::decrypt_bit(&coordinator.private_key, &rerandomized), Ok(true));
}

/// Wrong signers and unknown slots deactivate nothing.
#[test]
fn invalid_requests_encrypt_zero()
{
    let voter = keypair(2);
    let (mut state, poll_id) = get_state(&[voter]);
    request(&mut state, poll_id, 1, &keypair(3), 18);
    request(&mut state, poll_id, 7, &voter, 19);

    let output = state.process_deactivation_messages(poll_id, Fr::from(SEED)).unwrap();
    let coordinator = get_coordinator();

    for leaf in &output.deactivated_leaves
    {
        assert_eq!(elgamal::decrypt_bit(&coordinator.private_key, &leaf.ciphertext), Ok(false));
    }
    assert_eq!(output.deactivated_leaves[1].public_key.as_array(), [Fr::from(0u64); 2]);
}

/// The circuit record is padded to the queue size and masks chain from the seed.
#[test]
fn deactivation_inputs()
{
    let voter = keypair(2);
    let (mut state, poll_id) = get_state(&[voter]);
    let (message, enc_pub_key) = request(&mut state, poll_id, 1, &voter, 20);

    let chain_hash = state.poll(poll_id).unwrap().deactivated_keys_chain_hash();
    let output = state.process_deactivation_messages(poll_id, Fr::from(SEED)).unwrap();
    let inputs = &output.circuit_inputs;

    assert_eq!(inputs.masking_values.len(), 5);
    assert_eq!(inputs.masking_values[0], hash2([Fr::from(SEED), Fr::from(20u64)]).unwrap());
    assert_eq!(inputs.el_gamal_enc.len(), 5);
    assert_eq!(inputs.msgs.len(), 5);
    assert_eq!(inputs.msgs[0], message.as_array().to_vec());
    assert_eq!(inputs.msgs[4], vec![Fr::from(0u64); 11]);
    assert_eq!(inputs.enc_pub_keys[0], enc_pub_key.as_array());
    assert_eq!(inputs.enc_pub_keys[1], [Fr::from(0u64); 2]);
    assert_eq!(inputs.deactivated_tree_path_elements.len(), 5);
    assert_eq!(inputs.state_leaf_path_elements.len(), 5);
    assert_eq!(inputs.current_state_leaves.len(), 5);
    assert_eq!(inputs.current_state_leaves[0][0], voter.public_key.x());
    assert_eq!(inputs.chain_hash, chain_hash);
    assert_eq!(inputs.num_sign_ups, 1);

    let poll = state.poll(poll_id).unwrap();
    assert_eq!(inputs.deactivated_tree_root, poll.deactivated_keys_tree().root());
    assert_eq!(poll.deactivated_keys_tree().next_index(), 1);

    for [c1, c2] in &inputs.el_gamal_enc[1..]
    {
        let ciphertext = elgamal::Ciphertext {
            c1: crate::crypto::Point::new(c1[0], c1[1]),
            c2: crate::crypto::Point::new(c2[0], c2[1]),
        };
        assert_eq!(elgamal::decrypt_bit(&get_coordinator().private_key, &ciphertext), Ok(false));
    }
}

/// The chain-hash folds every request's message hash.
#[test]
fn chain_hash_advances()
{
    let voter = keypair(2);
    let (mut state, poll_id) = get_state(&[voter]);
    let initial = state.poll(poll_id).unwrap().deactivated_keys_chain_hash();

    let (message, enc_pub_key) = request(&mut state, poll_id, 1, &voter, 21);
    let expected = hash2([initial, message.hash(&enc_pub_key).unwrap()]).unwrap();

    assert_eq!(state.poll(poll_id).unwrap().deactivated_keys_chain_hash(), expected);
}

/// Deactivations are processed exactly once and never beyond the queue size.
#[test]
fn deactivation_guards()
{
    let voter = keypair(2);
    let (mut state, poll_id) = get_state(&[voter]);
    for salt in 0..6
    {
        request(&mut state, poll_id, 1, &voter, 30 + salt);
    }
    assert!(matches!(
        state.process_deactivation_messages(poll_id, Fr::from(SEED)),
        Err(Error::ProtocolViolation(ProtocolViolation::DeactivationQueueOverflow { count: 6, capacity: 5 }))
    ));

    let (mut state, poll_id) = get_state(&[voter]);
    request(&mut state, poll_id, 1, &voter, 40);
    state.process_deactivation_messages(poll_id, Fr::from(SEED)).unwrap();

    assert!(matches!(
        state.process_deactivation_messages(poll_id, Fr::from(SEED)),
        Err(Error::ProtocolViolation(ProtocolViolation::DeactivationAlreadyProcessed))
    ));
    let (message, enc_pub_key) = encrypt_vote(&vote(1, voter.public_key, 0, 0, 0, poll_id), &voter, 41);
    assert!(matches!(
        state.poll_mut(poll_id).unwrap().deactivate_key(message, enc_pub_key),
        Err(Error::ProtocolViolation(ProtocolViolation::DeactivationAlreadyProcessed))
    ));
}

/// A key generation request replaces the deactivated key, once.
#[test]
fn new_key_generation()
{
    let (voter, replacement) = (keypair(2), keypair(3));
    let (mut state, poll_id) = get_state(&[voter]);
    let salt = Fr::from(22u64);

    request(&mut state, poll_id, 1, &voter, 22);
    let output = state.process_deactivation_messages(poll_id, Fr::from(SEED)).unwrap();
    let leaf = output.deactivated_leaves[0].clone();
    state.poll_mut(poll_id).unwrap().process_deactivated_key_event(leaf.key_hash().unwrap(), leaf.ciphertext);

    let new_key = state
        .generate_circuit_inputs_for_new_key(poll_id, replacement.public_key, &voter.private_key, 1, Fr::from(50u64), salt)
        .unwrap();
    let inputs = &new_key.circuit_inputs;

    assert_eq!(inputs.nullifier, hash2([voter.private_key.as_circuit_input(), salt]).unwrap());
    assert_eq!(inputs.deactivated_key_index, 0);
    assert_eq!(inputs.old_credit_balance, Fr::from(100u64));
    assert_eq!(inputs.c1, leaf.ciphertext.c1.as_array());
    assert!(inputs.c1r != inputs.c1);
    assert_eq!(new_key.message.kind, MessageKind::KeyGen);

    // Published twice, the older copy finds its nullifier spent.
    let poll = state.poll_mut(poll_id).unwrap();
    poll.generate_new_key(new_key.message.clone(), new_key.enc_pub_key, 1).unwrap();
    poll.generate_new_key(new_key.message.clone(), new_key.enc_pub_key, 1).unwrap();
    assert_eq!(poll.num_key_gens(), 2);
    poll.merge_all_messages().unwrap();

    let batch = state.process_messages(poll_id).unwrap();
    let poll = state.poll(poll_id).unwrap();

    assert_eq!(poll.state_leaves()[1].public_key, replacement.public_key);
    assert_eq!(poll.state_leaves()[1].voice_credit_balance, Fr::from(50u64));
    assert!(poll.nullifier_tree().find(inputs.nullifier).unwrap().found);
    assert_eq!(batch.nullifier_inclusion_flags[..2], [Fr::from(0u64), Fr::from(1u64)]);
    assert_eq!(batch.msgs[0][0], Fr::from(MessageKind::KeyGen.tag()));
    assert_eq!(batch.msgs[0][11], Fr::from(1u64));
    assert_eq!(batch.num_keys_gens, 2);
}

/// Key generation needs a recorded deactivation and a real slot.
#[test]
fn new_key_preconditions()
{
    let voter = keypair(2);
    let (mut state, poll_id) = get_state(&[voter]);
    let replacement = keypair(3).public_key;

    assert!(matches!(
        state.generate_circuit_inputs_for_new_key(poll_id, replacement, &voter.private_key, 1, Fr::from(1u64), Fr::from(5u64)),
        Err(Error::InputValidation(InputError::UnknownDeactivatedKey))
    ));
    assert!(matches!(
        state.generate_circuit_inputs_for_new_key(poll_id, replacement, &voter.private_key, 4, Fr::from(1u64), Fr::from(5u64)),
        Err(Error::InputValidation(InputError::InvalidStateIndex { index: 4 }))
    ));
}

/// A key generation message with the wrong type is refused at ingestion.
#[test]
fn key_gen_type_check()
{
    let (mut state, poll_id) = get_state(&[keypair(2)]);
    let (message, _) = encrypt_vote(&vote(1, keypair(2).public_key, 0, 1, 1, poll_id), &keypair(2), 80);

    assert!(matches!(
        state.poll_mut(poll_id).unwrap().generate_new_key(message, keypair(5).public_key, 1),
        Err(Error::InputValidation(InputError::UnexpectedMessageType { expected: 3, found: 1 }))
    ));
}
