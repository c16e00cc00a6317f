use tracing::debug;
use crate::crypto::{gen_ecdh_shared_key, Ciphertext, PublicKey};
use crate::domain::{Command, DeactivatedKeyEvent, KeyGenCommand, Message, MessageKind, TopUpCommand, VoteCommand};
use crate::error::{Error, InputError, ProtocolViolation, Result};
use crate::hash::hash2;
use crate::poll::Poll;
use crate::types::Fr;

/// Message ingestion. Every call either fully succeeds or leaves the poll
/// untouched.
pub trait PollProvider: Sized
{
    /// Publishes an encrypted vote under the given ephemeral key.
    fn publish_message(&mut self, message: Message, enc_pub_key: PublicKey) -> Result<usize>;

    /// Publishes a top-up, which travels in the clear under the pad key.
    fn topup_message(&mut self, message: Message) -> Result<usize>;

    /// Publishes a key generation request targeting `new_state_index`.
    fn generate_new_key(&mut self, message: Message, enc_pub_key: PublicKey, new_state_index: u64) -> Result<usize>;

    /// Records a deactivation request and advances the chain-hash.
    fn deactivate_key(&mut self, message: Message, enc_pub_key: PublicKey) -> Result<usize>;

    /// Records a deactivation as observed on chain.
    fn process_deactivated_key_event(&mut self, key_hash: Fr, ciphertext: Ciphertext);

    /// Merges every enqueued message and returns the message root.
    fn merge_all_messages(&mut self) -> Result<Fr>;

    fn is_message_aq_merged(&self) -> bool;

    fn has_unprocessed_messages(&self) -> bool;

    fn message_limit_reached(&self) -> bool;
}

fn expect_kind(message: &Message, expected: MessageKind) -> Result<()>
{
    if message.kind != expected
    {
        Err(InputError::UnexpectedMessageType { expected: expected.tag(), found: message.kind.tag() })?
    }
    Ok(())
}

impl Poll
{
    /// Decrypts a vote or key generation message. A message that fails to
    /// decrypt yields a placeholder so batch slotting stays deterministic.
    pub(crate) fn decrypt_command(&self, message: &Message, enc_pub_key: &PublicKey) -> Result<Command>
    {
        let decrypted = gen_ecdh_shared_key(&self.coordinator.private_key, enc_pub_key)
            .map_err(Error::from)
            .and_then(|shared_key| match message.kind
            {
                MessageKind::Vote => VoteCommand::decrypt(message, &shared_key)
                    .map(|(command, signature)| Command::Vote(command, signature)),
                MessageKind::KeyGen => KeyGenCommand::decrypt(message, &shared_key).map(Command::KeyGen),
                MessageKind::TopUp => Ok(Command::TopUp(TopUpCommand::from_message(message, self.poll_id.into()))),
            });

        match decrypted
        {
            Err(Error::Crypto(reason)) =>
            {
                debug!(poll_id = self.poll_id, kind = ?message.kind, %reason, "substituting placeholder command");
                Ok(Command::Placeholder(message.kind))
            },
            other => other,
        }
    }

    fn ingest(&mut self, message: Message, enc_pub_key: PublicKey, command: Command) -> Result<usize>
    {
        let leaf = message.hash(&enc_pub_key)?;

        let index = self.message_aq.enqueue(leaf)?;
        self.message_tree.insert(leaf)?;

        self.messages.push(message);
        self.enc_pub_keys.push(enc_pub_key);
        self.commands.push(command);

        Ok(index)
    }

    fn check_message_limit(&self) -> Result<()>
    {
        if self.message_limit_reached()
        {
            Err(ProtocolViolation::MessageLimitReached(self.config.max_values.max_messages))?
        }
        if self.message_aq.is_merging() { Err(ProtocolViolation::EnqueueAfterMerge)? }
        Ok(())
    }
}

impl PollProvider for Poll
{
    fn publish_message(&mut self, message: Message, enc_pub_key: PublicKey) -> Result<usize>
    {
        expect_kind(&message, MessageKind::Vote)?;
        self.check_message_limit()?;

        let command = self.decrypt_command(&message, &enc_pub_key)?;
        self.ingest(message, enc_pub_key, command)
    }

    fn topup_message(&mut self, message: Message) -> Result<usize>
    {
        expect_kind(&message, MessageKind::TopUp)?;
        self.check_message_limit()?;

        let command = Command::TopUp(TopUpCommand::from_message(&message, self.poll_id.into()));
        self.ingest(message, PublicKey::pad_key(), command)
    }

    fn generate_new_key(&mut self, message: Message, enc_pub_key: PublicKey, new_state_index: u64) -> Result<usize>
    {
        expect_kind(&message, MessageKind::KeyGen)?;
        self.check_message_limit()?;

        let command = match self.decrypt_command(&message, &enc_pub_key)?
        {
            Command::KeyGen(mut command) =>
            {
                command.new_state_index = new_state_index;
                Command::KeyGen(command)
            },
            placeholder => placeholder,
        };
        let decrypted = matches!(command, Command::KeyGen(_));

        let index = self.ingest(message, enc_pub_key, command)?;
        if decrypted { self.num_key_gens += 1; }

        Ok(index)
    }

    fn deactivate_key(&mut self, message: Message, enc_pub_key: PublicKey) -> Result<usize>
    {
        expect_kind(&message, MessageKind::Vote)?;
        if self.deactivation.processed { Err(ProtocolViolation::DeactivationAlreadyProcessed)? }

        let message_hash = message.hash(&enc_pub_key)?;
        let chain_hash = hash2([self.deactivation.chain_hash, message_hash])?;
        let command = self.decrypt_command(&message, &enc_pub_key)?;

        let log = &mut self.deactivation;
        log.chain_hash = chain_hash;
        log.messages.push(message);
        log.enc_pub_keys.push(enc_pub_key);
        log.commands.push(command);

        Ok(log.messages.len() - 1)
    }

    fn process_deactivated_key_event(&mut self, key_hash: Fr, ciphertext: Ciphertext)
    {
        self.deactivated_key_events.push(DeactivatedKeyEvent { key_hash, ciphertext });
    }

    fn merge_all_messages(&mut self) -> Result<Fr>
    {
        let depth = self.config.tree_depths.message_tree_depth;

        // A poll without messages merges one all-zero sub-tree.
        if self.message_aq.num_leaves() == 0 { self.message_aq.fill()?; }

        self.message_aq.merge_sub_roots(0)?;
        let root = self.message_aq.merge(depth)?;

        if !self.is_message_aq_merged() { Err(ProtocolViolation::MessagesNotMerged)? }
        Ok(root)
    }

    fn is_message_aq_merged(&self) -> bool
    {
        let depth = self.config.tree_depths.message_tree_depth;
        self.message_aq.get_root(depth).map_or(false, |root| root == self.message_tree.root())
    }

    fn has_unprocessed_messages(&self) -> bool
    {
        // An empty poll still emits one batch of padding.
        let total_batches = self.messages.len().div_ceil(self.message_batch_size()).max(1);
        self.num_batches_processed < total_batches
    }

    fn message_limit_reached(&self) -> bool
    {
        self.messages.len() >= self.config.max_values.max_messages
    }
}
