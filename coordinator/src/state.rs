//! The State Engine: the signup registry, the deployed polls and the token
//! that lets one poll at a time replay its messages.

use tracing::info;
use crate::config::{BatchSizes, PollConfiguration};
use crate::crypto::{PrivateKey, PublicKey};
use crate::domain::SignupLeaf;
use crate::error::{ProtocolViolation, Result};
use crate::poll::inputs::{DeactivationOutput, NewKeyOutput, ProcessMessagesInputs};
use crate::poll::Poll;
use crate::tree::{AccQueue, IncrementalTree};
use crate::types::{Fr, PollId, STATE_TREE_ARITY, STATE_TREE_DEPTH, STATE_TREE_SUB_DEPTH};

/// Which poll, if any, is replaying its messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessingToken
{
    #[default]
    Idle,
    Processing(PollId),
}

impl ProcessingToken
{
    pub fn is_idle(&self) -> bool
    {
        *self == ProcessingToken::Idle
    }

    /// Fails when another poll holds the token.
    pub fn check(&self, poll_id: PollId) -> Result<()>
    {
        match *self
        {
            ProcessingToken::Processing(active) if active != poll_id =>
            {
                Err(ProtocolViolation::PollBusy { active, requested: poll_id })?
            },
            _ => Ok(()),
        }
    }

    pub fn acquire(&mut self, poll_id: PollId) -> Result<()>
    {
        self.check(poll_id)?;
        if self.is_idle()
        {
            info!(poll_id, "processing token acquired");
            *self = ProcessingToken::Processing(poll_id);
        }
        Ok(())
    }

    pub fn ensure_held(&self, poll_id: PollId) -> Result<()>
    {
        if *self != ProcessingToken::Processing(poll_id) { Err(ProtocolViolation::TokenNotHeld(poll_id))? }
        Ok(())
    }

    /// Returns the token to idle if `poll_id` holds it.
    pub fn release(&mut self, poll_id: PollId)
    {
        if *self == ProcessingToken::Processing(poll_id)
        {
            info!(poll_id, "processing token released");
            *self = ProcessingToken::Idle;
        }
    }
}

/// Every signup, in both tree and accumulator form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignupRegistry
{
    state_leaves: Vec<SignupLeaf>,
    state_tree: IncrementalTree,
    state_aq: AccQueue,

    /// Real signups, excluding the blank leaf at slot 0.
    num_signups: usize,
}

impl SignupRegistry
{
    /// An empty registry holding only the blank leaf.
    pub fn new() -> Result<Self>
    {
        let blank = SignupLeaf::blank();
        let blank_hash = blank.hash()?;

        let mut state_tree = IncrementalTree::new(STATE_TREE_DEPTH, blank_hash, STATE_TREE_ARITY)?;
        let mut state_aq = AccQueue::new(STATE_TREE_SUB_DEPTH, STATE_TREE_ARITY, blank_hash)?;
        state_tree.insert(blank_hash)?;
        state_aq.enqueue(blank_hash)?;

        Ok(SignupRegistry { state_leaves: vec![blank], state_tree, state_aq, num_signups: 0 })
    }

    pub fn sign_up(&mut self, public_key: PublicKey, voice_credit_balance: Fr, timestamp: Fr) -> Result<usize>
    {
        let leaf = SignupLeaf::new(public_key, voice_credit_balance, timestamp);
        let hash = leaf.hash()?;

        let index = self.state_aq.enqueue(hash)?;
        self.state_tree.insert(hash)?;
        self.state_leaves.push(leaf);
        self.num_signups += 1;

        Ok(index)
    }

    pub fn state_leaves(&self) -> &[SignupLeaf]
    {
        &self.state_leaves
    }

    pub fn state_tree(&self) -> &IncrementalTree
    {
        &self.state_tree
    }

    pub fn state_aq(&self) -> &AccQueue
    {
        &self.state_aq
    }

    pub fn num_signups(&self) -> usize
    {
        self.num_signups
    }

    pub fn merge_state_aq_sub_roots(&mut self, num_operations: usize) -> Result<()>
    {
        self.state_aq.merge_sub_roots(num_operations)
    }

    /// Merges the accumulator and checks it agrees with the state tree.
    pub fn merge_state_aq(&mut self) -> Result<Fr>
    {
        let root = self.state_aq.merge(STATE_TREE_DEPTH)?;
        if root != self.state_tree.root() { Err(ProtocolViolation::StateNotMerged)? }
        Ok(root)
    }
}

/// Signups, polls and the processing token of one coordinator.
#[derive(Clone, Debug)]
pub struct MaciState
{
    registry: SignupRegistry,

    /// Indexed by poll id. Null polls reserve an id and nothing else.
    polls: Vec<Option<Poll>>,

    processing: ProcessingToken,
}

impl MaciState
{
    pub fn new() -> Result<Self>
    {
        Ok(MaciState { registry: SignupRegistry::new()?, polls: Vec::new(), processing: ProcessingToken::Idle })
    }

    pub fn registry(&self) -> &SignupRegistry
    {
        &self.registry
    }

    pub fn processing(&self) -> ProcessingToken
    {
        self.processing
    }

    pub fn num_polls(&self) -> usize
    {
        self.polls.len()
    }

    pub fn sign_up(&mut self, public_key: PublicKey, voice_credit_balance: Fr, timestamp: Fr) -> Result<usize>
    {
        self.registry.sign_up(public_key, voice_credit_balance, timestamp)
    }

    fn next_poll_id(&self) -> PollId
    {
        self.polls.len() as PollId
    }

    /// Deploys a poll. Tally and subsidy batch sizes follow the
    /// intermediate state tree depth whatever the configuration says.
    pub fn deploy_poll(&mut self, mut config: PollConfiguration) -> Result<PollId>
    {
        let poll_id = self.next_poll_id();
        config.batch_sizes = BatchSizes {
            message_batch_size: config.batch_sizes.message_batch_size,
            ..BatchSizes::for_depths(&config.tree_depths)
        };

        let poll = Poll::new(poll_id, config)?;
        self.polls.push(Some(poll));

        info!(poll_id, "deployed poll");
        Ok(poll_id)
    }

    /// Like [`MaciState::deploy_poll`] with a caller supplied poll, e.g. one
    /// drawing from a seeded salt generator.
    pub fn deploy_poll_with(&mut self, build: impl FnOnce(PollId) -> Result<Poll>) -> Result<PollId>
    {
        let poll_id = self.next_poll_id();
        let poll = build(poll_id)?;
        self.polls.push(Some(poll));

        info!(poll_id, "deployed poll");
        Ok(poll_id)
    }

    pub fn deploy_null_poll(&mut self) -> Result<PollId>
    {
        let poll_id = self.next_poll_id();
        self.polls.push(None);
        Ok(poll_id)
    }

    pub fn poll(&self, poll_id: PollId) -> Result<&Poll>
    {
        match self.polls.get(poll_id as usize)
        {
            None => Err(ProtocolViolation::UnknownPoll(poll_id))?,
            Some(None) => Err(ProtocolViolation::NullPoll(poll_id))?,
            Some(Some(poll)) => Ok(poll),
        }
    }

    pub fn poll_mut(&mut self, poll_id: PollId) -> Result<&mut Poll>
    {
        Self::slot(&mut self.polls, poll_id)
    }

    pub fn merge_state_aq_sub_roots(&mut self, num_operations: usize) -> Result<()>
    {
        self.registry.merge_state_aq_sub_roots(num_operations)
    }

    pub fn merge_state_aq(&mut self) -> Result<Fr>
    {
        self.registry.merge_state_aq()
    }

    /// Processes the next message batch of `poll_id`, mediating the token.
    pub fn process_messages(&mut self, poll_id: PollId) -> Result<ProcessMessagesInputs>
    {
        let MaciState { registry, polls, processing } = self;
        let poll = Self::slot(polls, poll_id)?;
        poll.process_messages(registry, processing)
    }

    pub fn process_all_messages(&mut self, poll_id: PollId) -> Result<Vec<ProcessMessagesInputs>>
    {
        let MaciState { registry, polls, processing } = self;
        let poll = Self::slot(polls, poll_id)?;
        poll.process_all_messages(registry, processing)
    }

    pub fn process_deactivation_messages(&mut self, poll_id: PollId, seed: Fr) -> Result<DeactivationOutput>
    {
        let MaciState { registry, polls, .. } = self;
        Self::slot(polls, poll_id)?.process_deactivation_messages(registry, seed)
    }

    pub fn generate_circuit_inputs_for_new_key(
        &mut self,
        poll_id: PollId,
        new_public_key: PublicKey,
        deactivated_private_key: &PrivateKey,
        state_index: usize,
        new_credit_balance: Fr,
        salt: Fr,
    ) -> Result<NewKeyOutput>
    {
        let MaciState { registry, polls, .. } = self;
        Self::slot(polls, poll_id)?.generate_circuit_inputs_for_new_key(
            registry,
            new_public_key,
            deactivated_private_key,
            state_index,
            new_credit_balance,
            salt
        )
    }

    fn slot(polls: &mut [Option<Poll>], poll_id: PollId) -> Result<&mut Poll>
    {
        match polls.get_mut(poll_id as usize)
        {
            None => Err(ProtocolViolation::UnknownPoll(poll_id))?,
            Some(None) => Err(ProtocolViolation::NullPoll(poll_id))?,
            Some(Some(poll)) => Ok(poll),
        }
    }
}

impl PartialEq for MaciState
{
    fn eq(&self, other: &MaciState) -> bool
    {
        self.registry.state_leaves == other.registry.state_leaves && self.polls == other.polls
    }
}

impl Eq for MaciState {}
