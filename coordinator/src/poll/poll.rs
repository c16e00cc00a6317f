use std::collections::BTreeMap;
use tracing::info;
use crate::config::PollConfiguration;
use crate::crypto::{Keypair, PublicKey, SaltGenerator};
use crate::domain::{Ballot, Command, DeactivatedKeyEvent, Message, SignupLeaf};
use crate::error::{ProofPrecondition, ProtocolViolation, Result};
use crate::state::SignupRegistry;
use crate::tree::{AccQueue, IncrementalTree, SparseMerkleTree};
use crate::types::{
    Fr,
    PollId,
    DEACT_KEYS_TREE_ARITY,
    DEACT_KEYS_TREE_DEPTH,
    DEACT_MESSAGE_INIT_HASH,
    MESSAGE_TREE_ARITY,
    NOTHING_UP_MY_SLEEVE,
    STATE_TREE_ARITY,
    STATE_TREE_DEPTH
};

/// Where a poll stands in replaying its messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessingPhase
{
    #[default]
    NotStarted,

    /// `cursor` is the first message index of the next batch.
    InProgress { cursor: usize },

    Sealed,
}

/// The poll's private copy of the signup set, taken once on first use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot
{
    pub state_leaves: Vec<SignupLeaf>,
    pub state_tree: IncrementalTree,
    pub ballots: Vec<Ballot>,
    pub ballot_tree: IncrementalTree,
    pub num_signups: usize,
}

/// Messages published under the deactivation sub-protocol.
#[derive(Clone, Debug, Default)]
pub(crate) struct DeactivationLog
{
    pub messages: Vec<Message>,
    pub enc_pub_keys: Vec<PublicKey>,
    pub commands: Vec<Command>,
    pub chain_hash: Fr,
    pub processed: bool,
}

/// One voting round.
#[derive(Clone, Debug)]
pub struct Poll
{
    pub(crate) poll_id: PollId,
    pub(crate) config: PollConfiguration,
    pub(crate) coordinator: Keypair,

    pub(crate) messages: Vec<Message>,
    pub(crate) enc_pub_keys: Vec<PublicKey>,
    pub(crate) commands: Vec<Command>,
    pub(crate) message_aq: AccQueue,
    pub(crate) message_tree: IncrementalTree,

    pub(crate) snapshot: Option<Snapshot>,
    pub(crate) nullifier_tree: SparseMerkleTree,

    pub(crate) phase: ProcessingPhase,
    pub(crate) num_batches_processed: usize,
    pub(crate) sb_salts: BTreeMap<usize, Fr>,
    pub(crate) num_key_gens: u64,

    pub(crate) deactivation: DeactivationLog,
    pub(crate) deactivated_keys_tree: IncrementalTree,
    pub(crate) deactivated_key_events: Vec<DeactivatedKeyEvent>,

    pub(crate) num_batches_tallied: usize,
    pub(crate) subsidy_row_batch_index: usize,
    pub(crate) subsidy_column_batch_index: usize,

    pub(crate) salts: SaltGenerator,
}

impl Poll
{
    pub fn new(poll_id: PollId, config: PollConfiguration) -> Result<Self>
    {
        Self::with_salt_generator(poll_id, config, SaltGenerator::from_entropy())
    }

    /// A poll drawing its salts, masks and ephemeral keys from `salts`.
    pub fn with_salt_generator(poll_id: PollId, config: PollConfiguration, salts: SaltGenerator) -> Result<Self>
    {
        config.validate()?;
        let coordinator = config.coordinator_keypair()?;
        let depths = config.tree_depths;

        let mut nullifier_tree = SparseMerkleTree::new();
        nullifier_tree.insert(Fr::from(0u64), Fr::from(0u64))?;

        Ok(Poll {
            poll_id,
            coordinator,
            messages: Vec::new(),
            enc_pub_keys: Vec::new(),
            commands: Vec::new(),
            message_aq: AccQueue::new(depths.message_tree_sub_depth, MESSAGE_TREE_ARITY, NOTHING_UP_MY_SLEEVE)?,
            message_tree: IncrementalTree::new(depths.message_tree_depth, NOTHING_UP_MY_SLEEVE, MESSAGE_TREE_ARITY)?,
            snapshot: None,
            nullifier_tree,
            phase: ProcessingPhase::NotStarted,
            num_batches_processed: 0,
            sb_salts: BTreeMap::new(),
            num_key_gens: 0,
            deactivation: DeactivationLog { chain_hash: DEACT_MESSAGE_INIT_HASH, ..Default::default() },
            deactivated_keys_tree: IncrementalTree::new(
                DEACT_KEYS_TREE_DEPTH,
                DEACT_MESSAGE_INIT_HASH,
                DEACT_KEYS_TREE_ARITY
            )?,
            deactivated_key_events: Vec::new(),
            num_batches_tallied: 0,
            subsidy_row_batch_index: 0,
            subsidy_column_batch_index: 0,
            salts,
            config,
        })
    }

    pub fn poll_id(&self) -> PollId
    {
        self.poll_id
    }

    pub fn config(&self) -> &PollConfiguration
    {
        &self.config
    }

    pub fn coordinator(&self) -> &Keypair
    {
        &self.coordinator
    }

    pub fn messages(&self) -> &[Message]
    {
        &self.messages
    }

    pub fn enc_pub_keys(&self) -> &[PublicKey]
    {
        &self.enc_pub_keys
    }

    pub fn commands(&self) -> &[Command]
    {
        &self.commands
    }

    pub fn message_aq(&self) -> &AccQueue
    {
        &self.message_aq
    }

    pub fn message_tree(&self) -> &IncrementalTree
    {
        &self.message_tree
    }

    pub fn snapshot(&self) -> Option<&Snapshot>
    {
        self.snapshot.as_ref()
    }

    pub fn ballots(&self) -> &[Ballot]
    {
        self.snapshot.as_ref().map(|snapshot| snapshot.ballots.as_slice()).unwrap_or_default()
    }

    pub fn state_leaves(&self) -> &[SignupLeaf]
    {
        self.snapshot.as_ref().map(|snapshot| snapshot.state_leaves.as_slice()).unwrap_or_default()
    }

    pub fn nullifier_tree(&self) -> &SparseMerkleTree
    {
        &self.nullifier_tree
    }

    pub fn phase(&self) -> ProcessingPhase
    {
        self.phase
    }

    pub fn num_batches_processed(&self) -> usize
    {
        self.num_batches_processed
    }

    pub fn num_key_gens(&self) -> u64
    {
        self.num_key_gens
    }

    pub fn deactivated_keys_chain_hash(&self) -> Fr
    {
        self.deactivation.chain_hash
    }

    pub fn deactivated_keys_tree(&self) -> &IncrementalTree
    {
        &self.deactivated_keys_tree
    }

    pub fn deactivated_key_events(&self) -> &[DeactivatedKeyEvent]
    {
        &self.deactivated_key_events
    }

    pub(crate) fn message_batch_size(&self) -> usize
    {
        self.config.batch_sizes.message_batch_size
    }

    /// Copies the signup set and creates one blank ballot per signup. Later
    /// calls are no-ops, so signups made afterwards never reach this poll.
    pub(crate) fn ensure_snapshot(&mut self, registry: &SignupRegistry) -> Result<()>
    {
        if self.snapshot.is_some() { return Ok(()); }

        let num_signups = registry.num_signups();
        let limit = self.config.max_values.max_users;
        if num_signups > limit { Err(ProtocolViolation::SignupLimitExceeded { signups: num_signups, limit })? }

        let state_leaves = registry.state_leaves().to_vec();
        let state_tree = registry.state_tree().clone();

        let blank = Ballot::new(self.config.max_values.max_vote_options, self.config.tree_depths.vote_option_tree_depth)?;
        let blank_hash = blank.hash()?;
        let mut ballot_tree = IncrementalTree::new(STATE_TREE_DEPTH, blank_hash, STATE_TREE_ARITY)?;

        let ballots = vec![blank; state_leaves.len()];
        for _ in &ballots
        {
            ballot_tree.insert(blank_hash)?;
        }

        info!(poll_id = self.poll_id, num_signups, "snapshotted signup state");

        self.snapshot = Some(Snapshot { state_leaves, state_tree, ballots, ballot_tree, num_signups });
        Ok(())
    }

    pub(crate) fn snapshot_ref(&self) -> Result<&Snapshot>
    {
        Ok(self.snapshot.as_ref().ok_or(ProofPrecondition::MissingSnapshot)?)
    }
}

impl PartialEq for Poll
{
    /// Two polls are equal when deployed alike and fed the same messages.
    fn eq(&self, other: &Poll) -> bool
    {
        let (lhs, rhs) = (&self.config, &other.config);

        self.coordinator == other.coordinator
            && lhs.tree_depths == rhs.tree_depths
            && lhs.batch_sizes.tally_batch_size == rhs.batch_sizes.tally_batch_size
            && lhs.batch_sizes.message_batch_size == rhs.batch_sizes.message_batch_size
            && lhs.max_values == rhs.max_values
            && self.messages == other.messages
            && self.enc_pub_keys == other.enc_pub_keys
    }
}

impl Eq for Poll {}
