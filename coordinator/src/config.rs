use serde::{Deserialize, Serialize};
use crate::crypto::{Keypair, PrivateKey};
use crate::error::{InputError, Result};
use crate::types::{fr_from_decimal, Timestamp, MESSAGE_TREE_ARITY, STATE_TREE_ARITY, VOTE_OPTION_TREE_ARITY};

/// The default number of deactivation messages handled by one circuit run.
pub const DEFAULT_DEACTIVATION_QUEUE_SIZE: usize = 5;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDepths
{
    /// The depth of the intermediate state tree used when tallying.
    pub int_state_tree_depth: u8,

    /// The depth of the message tree.
    pub message_tree_depth: u8,

    /// The depth of each message sub-tree, one per processing batch.
    pub message_tree_sub_depth: u8,

    /// The depth of every ballot's vote option tree.
    pub vote_option_tree_depth: u8,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxValues
{
    /// The maximum number of participants permitted.
    pub max_users: usize,

    /// The maximum number of messages permitted.
    pub max_messages: usize,

    /// The number of vote options of the poll.
    pub max_vote_options: usize,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSizes
{
    pub tally_batch_size: usize,
    pub subsidy_batch_size: usize,
    pub message_batch_size: usize,
}

impl BatchSizes
{
    /// Tally and subsidy batches always cover one intermediate state tree.
    pub fn for_depths(depths: &TreeDepths) -> Self
    {
        let state_batch = STATE_TREE_ARITY.saturating_pow(depths.int_state_tree_depth.into());
        BatchSizes {
            tally_batch_size: state_batch,
            subsidy_batch_size: state_batch,
            message_batch_size: MESSAGE_TREE_ARITY.saturating_pow(depths.message_tree_sub_depth.into()),
        }
    }
}

/// How a vote weight is charged against a voice credit balance.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VoiceCreditModel
{
    /// A weight of `w` costs `w²` credits.
    #[default]
    Quadratic,

    /// A weight of `w` costs `w` credits.
    Linear,
}

/// Everything needed to deploy a poll.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollConfiguration
{
    pub tree_depths: TreeDepths,

    pub max_values: MaxValues,

    pub batch_sizes: BatchSizes,

    /// Unix timestamp at which voting closes.
    pub poll_end_timestamp: Timestamp,

    /// Decimal encoding of the coordinator's private key.
    pub coordinator_private_key: String,

    #[serde(default)]
    pub voice_credit_model: VoiceCreditModel,

    #[serde(default = "default_deactivation_queue_size")]
    pub deactivation_queue_size: usize,
}

fn default_deactivation_queue_size() -> usize
{
    DEFAULT_DEACTIVATION_QUEUE_SIZE
}

fn invalid(reason: impl Into<String>) -> InputError
{
    InputError::InvalidConfiguration(reason.into())
}

impl PollConfiguration
{
    pub fn new(
        tree_depths: TreeDepths,
        max_values: MaxValues,
        poll_end_timestamp: Timestamp,
        coordinator: &Keypair,
    ) -> Self
    {
        PollConfiguration {
            tree_depths,
            max_values,
            batch_sizes: BatchSizes::for_depths(&tree_depths),
            poll_end_timestamp,
            coordinator_private_key: crate::types::fr_to_decimal(&coordinator.private_key.raw()),
            voice_credit_model: VoiceCreditModel::default(),
            deactivation_queue_size: DEFAULT_DEACTIVATION_QUEUE_SIZE,
        }
    }

    /// Parses and validates a JSON encoded configuration.
    pub fn from_json(json: &str) -> Result<Self>
    {
        let config: PollConfiguration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String>
    {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn coordinator_keypair(&self) -> Result<Keypair>
    {
        let raw = fr_from_decimal(&self.coordinator_private_key)?;
        Ok(Keypair::from_private_key(PrivateKey::new(raw)))
    }

    pub fn validate(&self) -> Result<()>
    {
        let depths = &self.tree_depths;
        let capacity = |arity: usize, depth: u8| arity.checked_pow(depth.into());

        if depths.message_tree_depth == 0 { Err(invalid("message tree depth must be nonzero"))? }
        if depths.message_tree_sub_depth > depths.message_tree_depth
        {
            Err(invalid("message sub-tree depth exceeds the message tree depth"))?
        }

        if capacity(MESSAGE_TREE_ARITY, depths.message_tree_sub_depth) != Some(self.batch_sizes.message_batch_size)
        {
            Err(invalid("message batch size must equal 5^message_tree_sub_depth"))?
        }

        let state_batch = capacity(STATE_TREE_ARITY, depths.int_state_tree_depth);
        if state_batch != Some(self.batch_sizes.tally_batch_size) || state_batch != Some(self.batch_sizes.subsidy_batch_size)
        {
            Err(invalid("tally and subsidy batch sizes must equal 5^int_state_tree_depth"))?
        }

        if capacity(VOTE_OPTION_TREE_ARITY, depths.vote_option_tree_depth).map_or(true, |c| c < self.max_values.max_vote_options)
        {
            Err(invalid("vote options do not fit the vote option tree"))?
        }

        if capacity(MESSAGE_TREE_ARITY, depths.message_tree_depth).map_or(true, |c| c < self.max_values.max_messages)
        {
            Err(invalid("max messages exceed the message tree capacity"))?
        }

        if self.deactivation_queue_size == 0 { Err(invalid("deactivation queue size must be nonzero"))? }

        self.coordinator_keypair()?;
        Ok(())
    }
}
