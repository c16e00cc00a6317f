use ark_ff::Zero;
use num_bigint::BigUint;
use tracing::{debug, info};
use crate::config::{PollConfiguration, VoiceCreditModel};
use crate::crypto::{elgamal, Keypair, PublicKey};
use crate::domain::{Command, KeyGenCommand, Message, MessageKind, SignupLeaf, TopUpCommand};
use crate::error::{ProofPrecondition, ProtocolViolation, Result};
use crate::hash::{hash4, sha256_hash};
use crate::packing::ProcessMessageSmallVals;
use crate::poll::inputs::ProcessMessagesInputs;
use crate::poll::poll::{ProcessingPhase, Snapshot};
use crate::poll::provider::PollProvider;
use crate::poll::Poll;
use crate::state::{ProcessingToken, SignupRegistry};
use crate::tree::SparseMerkleTree;
use crate::types::{biguint_to_fr_mod_order, fr_to_biguint, fr_to_usize, Fr, PollId, STATE_TREE_DEPTH};

/// Why a command left the state untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoOp
{
    /// The slot lies past the last message of the final batch.
    Padding,
    Undecryptable,
    InvalidStateIndex,
    InvalidSignature,
    InvalidNonce,
    InvalidVoteOption,
    InsufficientVoiceCredits,
    WrongPoll,
    NullifierSpent,
    DeactivationNotConfirmed,
}

/// Pre-state proof material for one message slot.
struct SlotWitness
{
    state_leaf: [Fr; 4],
    state_leaf_path: Vec<Vec<Fr>>,
    ballot: [Fr; 2],
    ballot_path: Vec<Vec<Fr>>,
    vote_weight: Fr,
    vote_weight_path: Vec<Vec<Fr>>,
    nullifier_path: Vec<Fr>,
    nullifier_included: bool,
}

/// Reads the current state of `index` together with the weight of `option`.
fn slot_witness(snapshot: &Snapshot, index: usize, option: usize) -> Result<SlotWitness>
{
    let leaf = &snapshot.state_leaves[index];
    let ballot = &snapshot.ballots[index];

    Ok(SlotWitness {
        state_leaf: leaf.as_array(),
        state_leaf_path: snapshot.state_tree.gen_merkle_path(index)?.path_elements,
        ballot: ballot.as_array()?,
        ballot_path: snapshot.ballot_tree.gen_merkle_path(index)?.path_elements,
        vote_weight: Fr::from(ballot.vote(option)),
        vote_weight_path: ballot.vote_option_path(option)?.path_elements,
        nullifier_path: Vec::new(),
        nullifier_included: false,
    })
}

fn write_leaf(snapshot: &mut Snapshot, index: usize, leaf: SignupLeaf) -> Result<()>
{
    snapshot.state_tree.update(index, leaf.hash()?)?;
    snapshot.state_leaves[index] = leaf;
    Ok(())
}

/// The balance left after moving an option from `previous` to `new` weight.
fn remaining_credits(model: VoiceCreditModel, balance: &Fr, previous: u64, new: u64) -> Option<Fr>
{
    let (previous, new) = (BigUint::from(previous), BigUint::from(new));
    let (refund, cost) = match model
    {
        VoiceCreditModel::Quadratic => (&previous * &previous, &new * &new),
        VoiceCreditModel::Linear => (previous, new),
    };

    let available = fr_to_biguint(balance) + refund;
    (available >= cost).then(|| biguint_to_fr_mod_order(&(available - cost)))
}

fn apply_vote(snapshot: &mut Snapshot, config: &PollConfiguration, command: &Command) -> Result<Result<SlotWitness, NoOp>>
{
    let Command::Vote(command, signature) = command else { return Ok(Err(NoOp::Undecryptable)) };

    let index = usize::try_from(command.state_index).unwrap_or(usize::MAX);
    if index == 0 || index >= snapshot.ballots.len() || index >= snapshot.state_tree.next_index()
    {
        return Ok(Err(NoOp::InvalidStateIndex));
    }

    let leaf = &snapshot.state_leaves[index];
    let ballot = &snapshot.ballots[index];

    if !command.verify_signature(signature, &leaf.public_key) { return Ok(Err(NoOp::InvalidSignature)); }
    if command.nonce != ballot.nonce + 1 { return Ok(Err(NoOp::InvalidNonce)); }

    let option = usize::try_from(command.vote_option_index).unwrap_or(usize::MAX);
    if option >= config.max_values.max_vote_options { return Ok(Err(NoOp::InvalidVoteOption)); }

    let balance = remaining_credits(
        config.voice_credit_model,
        &leaf.voice_credit_balance,
        ballot.vote(option),
        command.new_vote_weight
    );
    let Some(balance) = balance else { return Ok(Err(NoOp::InsufficientVoiceCredits)) };

    let witness = slot_witness(snapshot, index, option)?;

    let new_leaf = SignupLeaf::new(command.new_public_key, balance, leaf.timestamp);
    let mut new_ballot = ballot.clone();
    new_ballot.nonce += 1;
    new_ballot.votes[option] = command.new_vote_weight;

    write_leaf(snapshot, index, new_leaf)?;
    snapshot.ballot_tree.update(index, new_ballot.hash()?)?;
    snapshot.ballots[index] = new_ballot;

    Ok(Ok(witness))
}

/// Top-ups carry no signature. An unknown slot credits nothing to slot zero.
fn apply_top_up(snapshot: &mut Snapshot, command: &TopUpCommand) -> Result<SlotWitness>
{
    let (index, amount) = match fr_to_usize(&command.state_index)
    {
        Some(index) if index < snapshot.ballots.len() => (index, command.amount),
        _ => (0, Fr::zero()),
    };

    let witness = slot_witness(snapshot, index, 0)?;

    let mut leaf = snapshot.state_leaves[index].clone();
    leaf.voice_credit_balance += amount;
    write_leaf(snapshot, index, leaf)?;

    Ok(witness)
}

fn apply_key_gen(
    snapshot: &mut Snapshot,
    nullifier_tree: &mut SparseMerkleTree,
    coordinator: &Keypair,
    poll_id: PollId,
    command: &KeyGenCommand,
) -> Result<Result<SlotWitness, NoOp>>
{
    if command.poll_id != Fr::from(poll_id) { return Ok(Err(NoOp::WrongPoll)); }

    let index = usize::try_from(command.new_state_index).unwrap_or(usize::MAX);
    if index == 0 || index >= snapshot.ballots.len() { return Ok(Err(NoOp::InvalidStateIndex)); }

    let proof = nullifier_tree.find(command.nullifier)?;
    if proof.found { return Ok(Err(NoOp::NullifierSpent)); }

    // The rerandomized status must still decrypt to "deactivated".
    if elgamal::decrypt_bit(&coordinator.private_key, &command.rerandomized()) != Ok(true)
    {
        return Ok(Err(NoOp::DeactivationNotConfirmed));
    }

    let mut witness = slot_witness(snapshot, index, 0)?;
    witness.nullifier_path = proof.padded_siblings(STATE_TREE_DEPTH as usize);
    witness.nullifier_included = true;

    nullifier_tree.insert(command.nullifier, Fr::from(1u64))?;

    let previous = &snapshot.state_leaves[index];
    let leaf = SignupLeaf::new(command.new_public_key, command.new_credit_balance, previous.timestamp);
    write_leaf(snapshot, index, leaf)?;

    Ok(Ok(witness))
}

/// The first message index of the first batch. Batches march from the
/// newest messages to the oldest, so a partial batch goes first.
fn initial_cursor(message_count: usize, batch_size: usize) -> usize
{
    match message_count % batch_size
    {
        0 => message_count.saturating_sub(batch_size),
        remainder => message_count - remainder,
    }
}

impl Poll
{
    /// Processes the next batch of messages and returns its circuit inputs.
    ///
    /// The first call snapshots the signup set and takes the processing
    /// token, which is released again once the last batch is done.
    pub(crate) fn process_messages(&mut self, registry: &SignupRegistry, token: &mut ProcessingToken) -> Result<ProcessMessagesInputs>
    {
        if self.phase == ProcessingPhase::Sealed || !self.has_unprocessed_messages()
        {
            Err(ProtocolViolation::NoUnprocessedMessages)?
        }

        if !self.is_message_aq_merged() { Err(ProtocolViolation::MessagesNotMerged)? }

        let depths = self.config.tree_depths;
        let msg_root = self.message_aq.get_root(depths.message_tree_depth)?;

        token.check(self.poll_id)?;
        self.ensure_snapshot(registry)?;
        token.acquire(self.poll_id)?;

        let batch_size = self.message_batch_size();
        let message_count = self.messages.len();
        let cursor = match self.phase
        {
            ProcessingPhase::InProgress { cursor } => cursor,
            _ => initial_cursor(message_count, batch_size),
        };
        let batch_end = (cursor + batch_size).min(message_count);

        let msgs = (cursor..cursor + batch_size)
            .map(|index| {
                let (message, new_state_index) = match self.messages.get(index)
                {
                    Some(message) => (message.clone(), self.commands[index].new_state_index()),
                    None => (Message::padding(), 0),
                };
                let mut row = message.as_array().to_vec();
                row.push(Fr::from(new_state_index));
                row
            })
            .collect();

        let fallback_key = self.enc_pub_keys.last().copied().unwrap_or_else(PublicKey::pad_key);
        let enc_pub_keys = (cursor..cursor + batch_size)
            .map(|index| self.enc_pub_keys.get(index).copied().unwrap_or(fallback_key).as_array())
            .collect();

        let msg_subroot_path = self.message_tree.gen_merkle_subroot_path(cursor, cursor + batch_size)?;

        let snapshot = self.snapshot_ref()?;
        let current_state_root = snapshot.state_tree.root();
        let current_ballot_root = snapshot.ballot_tree.root();
        let current_nullifier_root = self.nullifier_tree.root();
        let current_sb_salt = self.sb_salts.get(&cursor).copied().unwrap_or_default();
        let current_sb_commitment = hash4([current_state_root, current_ballot_root, current_nullifier_root, current_sb_salt])?;

        let packed_vals = ProcessMessageSmallVals {
            max_vote_options: self.config.max_values.max_vote_options as u64,
            num_users: snapshot.num_signups as u64,
            batch_start_index: cursor as u64,
            batch_end_index: batch_end as u64,
        }
        .pack()?;

        let witnesses = self.replay_batch(cursor, batch_size)?;

        self.num_batches_processed += 1;
        let next_cursor = cursor.saturating_sub(batch_size);

        let new_sb_salt = self.salts.next_salt();
        self.sb_salts.insert(next_cursor, new_sb_salt);

        let snapshot = self.snapshot_ref()?;
        let new_sb_commitment = hash4([
            snapshot.state_tree.root(),
            snapshot.ballot_tree.root(),
            self.nullifier_tree.root(),
            new_sb_salt,
        ])?;

        let input_hash = sha256_hash(&[
            packed_vals,
            self.coordinator.public_key.hash()?,
            msg_root,
            current_sb_commitment,
            new_sb_commitment,
            Fr::from(self.config.poll_end_timestamp),
        ]);

        let sealed = self.num_batches_processed * batch_size >= message_count;
        self.phase = if sealed { ProcessingPhase::Sealed } else { ProcessingPhase::InProgress { cursor: next_cursor } };
        if sealed { token.release(self.poll_id); }

        info!(
            poll_id = self.poll_id,
            cursor,
            batches = self.num_batches_processed,
            sealed,
            "processed message batch"
        );

        let mut inputs = ProcessMessagesInputs {
            poll_end_timestamp: self.config.poll_end_timestamp,
            packed_vals,
            msg_root,
            msgs,
            msg_subroot_path_elements: msg_subroot_path.path_elements,
            coord_priv_key: self.coordinator.private_key.as_circuit_input(),
            coord_pub_key: self.coordinator.public_key.as_array(),
            enc_pub_keys,
            current_state_root,
            current_ballot_root,
            current_sb_commitment,
            current_sb_salt,
            current_state_leaves: Vec::with_capacity(batch_size),
            current_state_leaves_path_elements: Vec::with_capacity(batch_size),
            current_ballots: Vec::with_capacity(batch_size),
            current_ballots_path_elements: Vec::with_capacity(batch_size),
            current_vote_weights: Vec::with_capacity(batch_size),
            current_vote_weights_path_elements: Vec::with_capacity(batch_size),
            current_nullifier_leaves_path_elements: Vec::with_capacity(batch_size),
            nullifier_inclusion_flags: Vec::with_capacity(batch_size),
            num_keys_gens: self.num_key_gens,
            current_nullifier_root,
            new_sb_salt,
            new_sb_commitment,
            input_hash,
        };

        for witness in witnesses
        {
            inputs.current_state_leaves.push(witness.state_leaf);
            inputs.current_state_leaves_path_elements.push(witness.state_leaf_path);
            inputs.current_ballots.push(witness.ballot);
            inputs.current_ballots_path_elements.push(witness.ballot_path);
            inputs.current_vote_weights.push(witness.vote_weight);
            inputs.current_vote_weights_path_elements.push(witness.vote_weight_path);
            inputs.current_nullifier_leaves_path_elements.push(witness.nullifier_path);
            inputs.nullifier_inclusion_flags.push(Fr::from(u64::from(witness.nullifier_included)));
        }

        Ok(inputs)
    }

    /// Applies the batch starting at `cursor` newest first and returns the
    /// witnesses in message order.
    fn replay_batch(&mut self, cursor: usize, batch_size: usize) -> Result<Vec<SlotWitness>>
    {
        let Poll { snapshot, nullifier_tree, commands, config, coordinator, poll_id, .. } = self;
        let snapshot = snapshot.as_mut().ok_or(ProofPrecondition::MissingSnapshot)?;
        let depth = STATE_TREE_DEPTH as usize;

        let mut witnesses = Vec::with_capacity(batch_size);
        for offset in 0..batch_size
        {
            let index = cursor + batch_size - offset - 1;
            let zero_proof = nullifier_tree.find(Fr::zero())?.padded_siblings(depth);

            let outcome = match commands.get(index)
            {
                None => Err(NoOp::Padding),
                Some(Command::TopUp(command)) => Ok(apply_top_up(snapshot, command)?),
                Some(Command::KeyGen(command)) =>
                {
                    apply_key_gen(snapshot, nullifier_tree, coordinator, *poll_id, command)?
                },
                Some(Command::Placeholder(MessageKind::KeyGen | MessageKind::TopUp)) => Err(NoOp::Undecryptable),
                Some(command) => apply_vote(snapshot, config, command)?,
            };

            let witness = match outcome
            {
                Ok(mut witness) =>
                {
                    if !witness.nullifier_included { witness.nullifier_path = zero_proof; }
                    witness
                },
                Err(reason) =>
                {
                    debug!(poll_id = *poll_id, index, ?reason, "message is a no-op");
                    let mut witness = slot_witness(snapshot, 0, 0)?;
                    witness.nullifier_path = zero_proof;
                    witness
                },
            };
            witnesses.push(witness);
        }

        witnesses.reverse();
        Ok(witnesses)
    }

    /// Processes every remaining batch.
    pub(crate) fn process_all_messages(&mut self, registry: &SignupRegistry, token: &mut ProcessingToken) -> Result<Vec<ProcessMessagesInputs>>
    {
        let mut batches = Vec::new();
        while self.phase != ProcessingPhase::Sealed && self.has_unprocessed_messages()
        {
            batches.push(self.process_messages(registry, token)?);
        }
        Ok(batches)
    }
}
