use num_bigint::BigUint;
use crate::crypto::{elgamal, gen_ecdh_shared_key, PublicKey};
use crate::domain::deactivated::deactivated_key_hash;
use crate::domain::{Ballot, DeactivatedKeyLeaf, KeyGenCommand, Message, MessageKind, SignupLeaf, VoteCommand};
use crate::error::{Error, InputError};
use crate::tests::{keypair, vote};
use crate::tree::IncrementalTree;
use crate::types::{fr_from_decimal, modulus, Fr};

/// The blank leaf hashes to the well-known empty state leaf.
#[test]
fn blank_leaf_hash()
{
    let expected = fr_from_decimal("6769006970205099520508948723718471724660867171122235270773600567925038008762").unwrap();
    assert_eq!(SignupLeaf::blank().hash().unwrap(), expected);
}

/// A fresh ballot commits to an all-zero vote option tree.
#[test]
fn blank_ballot()
{
    let ballot = Ballot::new(5, 1).unwrap();
    let empty = IncrementalTree::new(1, Fr::from(0u64), 5).unwrap();

    assert_eq!(ballot.votes, vec![0; 5]);
    assert_eq!(ballot.vote_option_root().unwrap(), empty.root());
    assert_eq!(ballot.as_array().unwrap(), [Fr::from(0u64), empty.root()]);
}

/// Vote weights land at their option's position.
#[test]
fn ballot_vote_option_tree()
{
    let mut ballot = Ballot::new(5, 1).unwrap();
    ballot.votes[2] = 9;

    let path = ballot.vote_option_path(2).unwrap();
    assert_eq!(path.leaf, Fr::from(9u64));
    assert_eq!(path.root, ballot.vote_option_root().unwrap());
    assert!(IncrementalTree::verify_merkle_path(&path, 5).unwrap());
    assert_eq!(ballot.vote(7), 0);
}

/// A ballot refuses more options than its tree holds.
#[test]
fn ballot_capacity()
{
    assert!(matches!(Ballot::new(6, 1), Err(Error::InputValidation(InputError::InvalidConfiguration(_)))));
}

/// Raw messages are checked for type, length and field membership.
#[test]
fn message_from_raw()
{
    let data: Vec<BigUint> = (0..10u32).map(BigUint::from).collect();

    let message = Message::from_raw(&BigUint::from(2u32), &data).unwrap();
    assert_eq!(message.kind, MessageKind::TopUp);
    assert_eq!(message.as_array()[0], Fr::from(2u64));
    assert_eq!(message.as_array()[10], Fr::from(9u64));

    assert!(matches!(
        Message::from_raw(&BigUint::from(4u32), &data),
        Err(Error::InputValidation(InputError::UnknownMessageType(_)))
    ));
    assert!(matches!(
        Message::from_raw(&BigUint::from(1u32), &data[..9]),
        Err(Error::InputValidation(InputError::InvalidDataLength { expected: 10, found: 9 }))
    ));

    let mut oversized = data.clone();
    oversized[3] = modulus();
    assert!(matches!(
        Message::from_raw(&BigUint::from(1u32), &oversized),
        Err(Error::InputValidation(InputError::NotInField))
    ));
}

/// The message leaf binds the ephemeral key.
#[test]
fn message_hash_binds_key()
{
    let message = Message::padding();
    let first = message.hash(&keypair(2).public_key).unwrap();
    let second = message.hash(&keypair(3).public_key).unwrap();
    assert!(first != second);
}

/// A vote survives encryption and its signature still verifies.
#[test]
fn vote_command_encryption()
{
    let voter = keypair(20);
    let (coordinator, ephemeral) = (keypair(1), keypair(21));
    let command = vote(3, voter.public_key, 2, 7, 1, 0);
    let signature = command.sign(&voter.private_key).unwrap();

    let shared = gen_ecdh_shared_key(&ephemeral.private_key, &coordinator.public_key).unwrap();
    let message = command.encrypt(&signature, &shared).unwrap();
    assert_eq!(message.kind, MessageKind::Vote);

    let shared = gen_ecdh_shared_key(&coordinator.private_key, &ephemeral.public_key).unwrap();
    let (decrypted, decrypted_signature) = VoteCommand::decrypt(&message, &shared).unwrap();
    assert_eq!(decrypted, command);
    assert!(decrypted.verify_signature(&decrypted_signature, &voter.public_key));
    assert!(!decrypted.verify_signature(&decrypted_signature, &keypair(22).public_key));
}

/// Vote fields are limited to 50 bits.
#[test]
fn vote_command_slot_limit()
{
    let key = PublicKey::pad_key();
    assert!(matches!(
        VoteCommand::new(1 << 50, key, 0, 0, 1, 0, Fr::from(0u64)),
        Err(Error::InputValidation(InputError::SlotOverflow { bits: 50 }))
    ));
}

/// Key generation commands survive encryption.
#[test]
fn key_gen_command_encryption()
{
    let (coordinator, ephemeral) = (keypair(1), keypair(23));
    let ciphertext = elgamal::encrypt_bit(&coordinator.public_key, true, &BigUint::from(5u32));
    let command = KeyGenCommand::new(keypair(24).public_key, Fr::from(50u64), Fr::from(77u64), ciphertext, 4);

    let shared = gen_ecdh_shared_key(&ephemeral.private_key, &coordinator.public_key).unwrap();
    let message = command.encrypt(&shared).unwrap();
    assert_eq!(message.kind, MessageKind::KeyGen);

    let decrypted = KeyGenCommand::decrypt(&message, &shared).unwrap();
    assert_eq!(decrypted, command);
    assert_eq!(decrypted.rerandomized(), ciphertext);
}

/// A leaf's event hashes like the leaf itself.
#[test]
fn deactivated_leaf_event()
{
    let key = keypair(25).public_key;
    let ciphertext = elgamal::encrypt_bit(&keypair(1).public_key, true, &BigUint::from(9u32));
    let leaf = DeactivatedKeyLeaf::new(key, ciphertext, Fr::from(31u64));

    let event = leaf.event().unwrap();
    assert_eq!(event.key_hash, deactivated_key_hash(&key, Fr::from(31u64)).unwrap());
    assert_eq!(event.leaf_hash().unwrap(), leaf.hash().unwrap());
}
