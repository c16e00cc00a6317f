//! Bit-packed public inputs and verifying-key signatures.
//!
//! Several small accounting quantities share one field element, each in a
//! fixed 50-bit slot. Unpacking rejects values exceeding the bit budget of
//! the encoding instead of silently truncating them.

use ark_ff::{BigInteger, PrimeField};
use crate::error::{InputError, Result};
use crate::types::{Fr, SMALL_VALUE_BITS};

#[allow(clippy::assign_op_pattern, clippy::ptr_offset_with_cast, clippy::manual_range_contains)]
mod wide
{
    uint::construct_uint! {
        /// 256-bit unsigned integer.
        pub struct U256(4);
    }
}

pub use wide::U256;

pub fn u256_to_fr(value: U256) -> Fr
{
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    Fr::from_le_bytes_mod_order(&bytes)
}

pub fn fr_to_u256(value: &Fr) -> U256
{
    U256::from_little_endian(&value.into_bigint().to_bytes_le())
}

fn slot_mask() -> U256
{
    (U256::one() << SMALL_VALUE_BITS) - U256::one()
}

/// Packs `values` into consecutive 50-bit slots, the first value lowest.
pub fn pack_slots(values: &[u64]) -> Result<U256>
{
    if values.len() * SMALL_VALUE_BITS > 256
    {
        Err(InputError::PackedOverflow { bits: 256 })?
    }

    let mut packed = U256::zero();
    for (slot, value) in values.iter().enumerate()
    {
        if *value >> SMALL_VALUE_BITS != 0 { Err(InputError::SlotOverflow { bits: SMALL_VALUE_BITS })? }
        packed = packed | (U256::from(*value) << (slot * SMALL_VALUE_BITS));
    }
    Ok(packed)
}

/// Reads `count` 50-bit slots, ignoring any higher bits.
pub fn unpack_slots(packed: U256, count: usize) -> Vec<u64>
{
    (0..count)
        .map(|slot| ((packed >> (slot * SMALL_VALUE_BITS)) & slot_mask()).low_u64())
        .collect()
}

fn check_budget(packed: &U256, bits: usize) -> Result<()>
{
    if packed.bits() > bits { Err(InputError::PackedOverflow { bits })? }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessMessageSmallVals
{
    pub max_vote_options: u64,
    pub num_users: u64,
    pub batch_start_index: u64,
    pub batch_end_index: u64,
}

impl ProcessMessageSmallVals
{
    pub fn pack(&self) -> Result<Fr>
    {
        let packed = pack_slots(&[
            self.max_vote_options,
            self.num_users,
            self.batch_start_index,
            self.batch_end_index,
        ])?;
        Ok(u256_to_fr(packed))
    }

    pub fn unpack(packed: &Fr) -> Result<Self>
    {
        let packed = fr_to_u256(packed);
        check_budget(&packed, 4 * SMALL_VALUE_BITS)?;

        let slots = unpack_slots(packed, 4);
        Ok(ProcessMessageSmallVals {
            max_vote_options: slots[0],
            num_users: slots[1],
            batch_start_index: slots[2],
            batch_end_index: slots[3],
        })
    }
}

pub fn pack_process_message_small_vals(
    max_vote_options: u64,
    num_users: u64,
    batch_start_index: u64,
    batch_end_index: u64,
) -> Result<Fr>
{
    ProcessMessageSmallVals { max_vote_options, num_users, batch_start_index, batch_end_index }.pack()
}

pub fn unpack_process_message_small_vals(packed: &Fr) -> Result<ProcessMessageSmallVals>
{
    ProcessMessageSmallVals::unpack(packed)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TallyVotesSmallVals
{
    /// The index of the tally batch, i.e. its start index over the batch size.
    pub batch_number: u64,
    pub num_sign_ups: u64,
}

pub fn pack_tally_votes_small_vals(batch_start_index: u64, batch_size: u64, num_sign_ups: u64) -> Result<Fr>
{
    let batch_number = batch_start_index.checked_div(batch_size).unwrap_or(0);
    Ok(u256_to_fr(pack_slots(&[batch_number, num_sign_ups])?))
}

pub fn unpack_tally_votes_small_vals(packed: &Fr) -> Result<TallyVotesSmallVals>
{
    let packed = fr_to_u256(packed);
    check_budget(&packed, 2 * SMALL_VALUE_BITS)?;

    let slots = unpack_slots(packed, 2);
    Ok(TallyVotesSmallVals { batch_number: slots[0], num_sign_ups: slots[1] })
}

pub fn pack_subsidy_small_vals(row: u64, col: u64, num_sign_ups: u64) -> Result<Fr>
{
    Ok(u256_to_fr(pack_slots(&[col, row, num_sign_ups])?))
}

fn vk_sig(parts: &[(u64, usize)]) -> Fr
{
    let sig = parts
        .iter()
        .fold(U256::zero(), |acc, (value, shift)| acc + (U256::from(*value) << *shift));
    u256_to_fr(sig)
}

pub fn gen_process_vk_sig(state_tree_depth: u8, message_tree_depth: u8, vote_option_tree_depth: u8, batch_size: u64) -> Fr
{
    vk_sig(&[
        (batch_size, 192),
        (state_tree_depth.into(), 128),
        (message_tree_depth.into(), 64),
        (vote_option_tree_depth.into(), 0),
    ])
}

pub fn gen_tally_vk_sig(state_tree_depth: u8, int_state_tree_depth: u8, vote_option_tree_depth: u8) -> Fr
{
    vk_sig(&[
        (state_tree_depth.into(), 128),
        (int_state_tree_depth.into(), 64),
        (vote_option_tree_depth.into(), 0),
    ])
}

pub fn gen_subsidy_vk_sig(state_tree_depth: u8, int_state_tree_depth: u8, vote_option_tree_depth: u8) -> Fr
{
    gen_tally_vk_sig(state_tree_depth, int_state_tree_depth, vote_option_tree_depth)
}

pub fn gen_deactivation_vk_sig(message_queue_size: u64, state_tree_depth: u8) -> Fr
{
    vk_sig(&[(message_queue_size, 64), (state_tree_depth.into(), 0)])
}

pub fn gen_new_key_generation_vk_sig(state_tree_depth: u8, message_tree_depth: u8) -> Fr
{
    vk_sig(&[(state_tree_depth.into(), 128), (message_tree_depth.into(), 0)])
}
