//! Circuit-input records emitted by a poll.
//!
//! Field elements serialize as decimal strings and small counters as plain
//! numbers, matching what the proving toolchain reads.

use serde::Serialize;
use crate::crypto::PublicKey;
use crate::domain::{DeactivatedKeyLeaf, Message};
use crate::error::Result;
use crate::types::Fr;

pub(crate) mod decimal
{
    use serde::{Serialize, Serializer};
    use crate::types::{fr_to_decimal, Fr};

    pub trait AsDecimal
    {
        type Output: Serialize;

        fn as_decimal(&self) -> Self::Output;
    }

    impl AsDecimal for Fr
    {
        type Output = String;

        fn as_decimal(&self) -> String
        {
            fr_to_decimal(self)
        }
    }

    impl<T: AsDecimal> AsDecimal for Vec<T>
    {
        type Output = Vec<T::Output>;

        fn as_decimal(&self) -> Self::Output
        {
            self.iter().map(AsDecimal::as_decimal).collect()
        }
    }

    impl<T: AsDecimal, const N: usize> AsDecimal for [T; N]
    {
        type Output = Vec<T::Output>;

        fn as_decimal(&self) -> Self::Output
        {
            self.iter().map(AsDecimal::as_decimal).collect()
        }
    }

    pub fn serialize<T: AsDecimal, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    {
        value.as_decimal().serialize(serializer)
    }
}

/// Inputs of one message-processing circuit run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMessagesInputs
{
    pub poll_end_timestamp: u64,

    #[serde(serialize_with = "decimal::serialize")]
    pub packed_vals: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub msg_root: Fr,

    /// Every message of the batch followed by its new state index.
    #[serde(serialize_with = "decimal::serialize")]
    pub msgs: Vec<Vec<Fr>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub msg_subroot_path_elements: Vec<Vec<Fr>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub coord_priv_key: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub coord_pub_key: [Fr; 2],

    #[serde(serialize_with = "decimal::serialize")]
    pub enc_pub_keys: Vec<[Fr; 2]>,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_state_root: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_ballot_root: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_sb_commitment: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_sb_salt: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_state_leaves: Vec<[Fr; 4]>,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_state_leaves_path_elements: Vec<Vec<Vec<Fr>>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_ballots: Vec<[Fr; 2]>,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_ballots_path_elements: Vec<Vec<Vec<Fr>>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_vote_weights: Vec<Fr>,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_vote_weights_path_elements: Vec<Vec<Vec<Fr>>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_nullifier_leaves_path_elements: Vec<Vec<Fr>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub nullifier_inclusion_flags: Vec<Fr>,

    pub num_keys_gens: u64,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_nullifier_root: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub new_sb_salt: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub new_sb_commitment: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub input_hash: Fr,
}

/// Inputs of the key deactivation circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivationInputs
{
    #[serde(serialize_with = "decimal::serialize")]
    pub coord_priv_key: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub coord_pub_key: [Fr; 2],

    #[serde(serialize_with = "decimal::serialize")]
    pub enc_pub_keys: Vec<[Fr; 2]>,

    #[serde(serialize_with = "decimal::serialize")]
    pub msgs: Vec<Vec<Fr>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub deactivated_tree_path_elements: Vec<Vec<Vec<Fr>>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub state_leaf_path_elements: Vec<Vec<Vec<Fr>>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_state_leaves: Vec<[Fr; 4]>,

    /// `[c1, c2]` per message, each a point.
    #[serde(serialize_with = "decimal::serialize")]
    pub el_gamal_enc: Vec<[[Fr; 2]; 2]>,

    #[serde(serialize_with = "decimal::serialize")]
    pub masking_values: Vec<Fr>,

    #[serde(serialize_with = "decimal::serialize")]
    pub deactivated_tree_root: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub current_state_root: Fr,

    pub num_sign_ups: u64,

    #[serde(serialize_with = "decimal::serialize")]
    pub chain_hash: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub input_hash: Fr,
}

/// Inputs of the key generation circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKeyInputs
{
    #[serde(serialize_with = "decimal::serialize")]
    pub old_priv_key: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub new_pub_key: [Fr; 2],

    pub num_sign_ups: u64,

    pub state_index: u64,

    #[serde(serialize_with = "decimal::serialize")]
    pub salt: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub state_tree_root: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub deactivated_keys_root: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub state_tree_inclusion_proof: Vec<Vec<Fr>>,

    #[serde(serialize_with = "decimal::serialize")]
    pub old_credit_balance: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub new_credit_balance: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub state_leaf_timestamp: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub deactivated_keys_inclusion_proof: Vec<Vec<Fr>>,

    pub deactivated_key_index: u64,

    #[serde(serialize_with = "decimal::serialize")]
    pub c1: [Fr; 2],

    #[serde(serialize_with = "decimal::serialize")]
    pub c2: [Fr; 2],

    #[serde(serialize_with = "decimal::serialize")]
    pub coordinator_pub_key: [Fr; 2],

    #[serde(serialize_with = "decimal::serialize")]
    pub enc_priv_key: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub c1r: [Fr; 2],

    #[serde(serialize_with = "decimal::serialize")]
    pub c2r: [Fr; 2],

    #[serde(serialize_with = "decimal::serialize")]
    pub z: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub nullifier: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub poll_id: Fr,

    #[serde(serialize_with = "decimal::serialize")]
    pub input_hash: Fr,
}

/// Everything produced by one run of deactivation processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeactivationOutput
{
    pub circuit_inputs: DeactivationInputs,
    pub deactivated_leaves: Vec<DeactivatedKeyLeaf>,
}

/// A key generation request ready to be published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewKeyOutput
{
    pub circuit_inputs: NewKeyInputs,
    pub enc_pub_key: PublicKey,
    pub message: Message,
}

macro_rules! impl_to_json {
    ($($record:ty),*) => {
        $(
            impl $record
            {
                pub fn to_json(&self) -> Result<String>
                {
                    Ok(serde_json::to_string(self)?)
                }
            }
        )*
    };
}

impl_to_json!(ProcessMessagesInputs, DeactivationInputs, NewKeyInputs);
