use proptest::prelude::*;
use crate::error::{Error, InputError};
use crate::packing::{
    gen_deactivation_vk_sig,
    gen_new_key_generation_vk_sig,
    gen_process_vk_sig,
    gen_subsidy_vk_sig,
    gen_tally_vk_sig,
    pack_process_message_small_vals,
    pack_slots,
    pack_subsidy_small_vals,
    pack_tally_votes_small_vals,
    u256_to_fr,
    unpack_process_message_small_vals,
    unpack_tally_votes_small_vals,
    ProcessMessageSmallVals,
    U256
};
use crate::types::Fr;

const SLOT_LIMIT: u64 = 1 << 50;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Unpacking inverts packing for every in-range quadruple.
    #[test]
    fn process_small_vals_round_trip(
        max_vote_options in 0..SLOT_LIMIT,
        num_users in 0..SLOT_LIMIT,
        batch_start_index in 0..SLOT_LIMIT,
        batch_end_index in 0..SLOT_LIMIT,
    )
    {
        let vals = ProcessMessageSmallVals { max_vote_options, num_users, batch_start_index, batch_end_index };
        let packed = vals.pack().unwrap();
        prop_assert_eq!(ProcessMessageSmallVals::unpack(&packed).unwrap(), vals);
    }
}

/// The first value occupies the lowest slot.
#[test]
fn slot_layout()
{
    let packed = pack_process_message_small_vals(5, 3, 10, 15).unwrap();
    let expected = U256::from(5u64)
        + (U256::from(3u64) << 50usize)
        + (U256::from(10u64) << 100usize)
        + (U256::from(15u64) << 150usize);
    assert_eq!(packed, u256_to_fr(expected));

    let unpacked = unpack_process_message_small_vals(&packed).unwrap();
    assert_eq!(unpacked.batch_end_index, 15);
}

/// Values wider than a slot are refused.
#[test]
fn slot_overflow()
{
    assert!(matches!(
        pack_slots(&[SLOT_LIMIT]),
        Err(Error::InputValidation(InputError::SlotOverflow { bits: 50 }))
    ));
}

/// Unpacking rejects values beyond the encoding's budget.
#[test]
fn budget_overflow()
{
    let too_wide = u256_to_fr(U256::one() << 200usize);
    assert!(matches!(
        ProcessMessageSmallVals::unpack(&too_wide),
        Err(Error::InputValidation(InputError::PackedOverflow { bits: 200 }))
    ));

    let too_wide = u256_to_fr(U256::one() << 100usize);
    assert!(matches!(
        unpack_tally_votes_small_vals(&too_wide),
        Err(Error::InputValidation(InputError::PackedOverflow { bits: 100 }))
    ));
}

/// Tally packing stores the batch number rather than the start index.
#[test]
fn tally_small_vals()
{
    let packed = pack_tally_votes_small_vals(50, 25, 7).unwrap();
    let unpacked = unpack_tally_votes_small_vals(&packed).unwrap();
    assert_eq!(unpacked.batch_number, 2);
    assert_eq!(unpacked.num_sign_ups, 7);
}

/// Subsidy packing puts the column first.
#[test]
fn subsidy_small_vals()
{
    let packed = pack_subsidy_small_vals(1, 2, 3).unwrap();
    assert_eq!(packed, u256_to_fr(U256::from(2u64) + (U256::from(1u64) << 50usize) + (U256::from(3u64) << 100usize)));
}

/// Verifying-key signatures shift each parameter by 64 bits.
#[test]
fn vk_signatures()
{
    let sig = gen_process_vk_sig(10, 2, 1, 5);
    let expected = (U256::from(5u64) << 192usize) + (U256::from(10u64) << 128usize) + (U256::from(2u64) << 64usize) + U256::one();
    assert_eq!(sig, u256_to_fr(expected));

    assert_eq!(gen_deactivation_vk_sig(5, 10), Fr::from((5u128 << 64) + 10));

    let tally = (U256::from(10u64) << 128usize) + (U256::from(1u64) << 64usize) + U256::from(2u64);
    assert_eq!(gen_tally_vk_sig(10, 1, 2), u256_to_fr(tally));
    assert_eq!(gen_subsidy_vk_sig(10, 1, 2), gen_tally_vk_sig(10, 1, 2));

    let new_key = (U256::from(10u64) << 128usize) + U256::from(2u64);
    assert_eq!(gen_new_key_generation_vk_sig(10, 2), u256_to_fr(new_key));
}
