//! Field aliases, protocol constants and conversions between representations.

use ark_ff::{BigInteger, MontFp, PrimeField};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use crate::error::{InputError, Result};

pub use ark_bn254::Fr;

pub type PollId = u32;
pub type Timestamp = u64;

/// Number of field elements carried by every message.
pub const MESSAGE_DATA_LENGTH: usize = 10;

pub const STATE_TREE_DEPTH: u8 = 10;
pub const STATE_TREE_ARITY: usize = 5;
pub const STATE_TREE_SUB_DEPTH: u8 = 2;

pub const MESSAGE_TREE_ARITY: usize = 5;
pub const VOTE_OPTION_TREE_ARITY: usize = 5;

pub const DEACT_KEYS_TREE_DEPTH: u8 = 10;
pub const DEACT_KEYS_TREE_ARITY: usize = 5;

/// Width of each slot of a packed small-value encoding.
pub const SMALL_VALUE_BITS: usize = 50;

/// keccak256("Maci") reduced into the field.
pub const NOTHING_UP_MY_SLEEVE: Fr =
    MontFp!("8370432830353022751713833565135785980866757267633941821328460903436894336785");

/// Seed of the deactivation chain-hash.
pub const DEACT_MESSAGE_INIT_HASH: Fr = NOTHING_UP_MY_SLEEVE;

/// The well-known key used by blank signup leaves and top-up messages.
pub const PAD_KEY_X: Fr =
    MontFp!("10457101036533406547632367118273992217979173478358440826365724437999023779287");
pub const PAD_KEY_Y: Fr =
    MontFp!("19824078218392094440610104313265183977899662750282163392862422243483260492317");

/// The scalar field modulus as an unbounded integer.
pub fn modulus() -> BigUint
{
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}

pub fn fr_to_biguint(value: &Fr) -> BigUint
{
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

/// Reduces an arbitrary integer into the field.
pub fn biguint_to_fr_mod_order(value: &BigUint) -> Fr
{
    Fr::from_le_bytes_mod_order(&value.to_bytes_le())
}

/// Converts an integer into the field, rejecting values at or above the modulus.
pub fn biguint_to_fr(value: &BigUint) -> Result<Fr>
{
    if *value >= modulus() { Err(InputError::NotInField)? }
    Ok(biguint_to_fr_mod_order(value))
}

pub fn fr_from_decimal(value: &str) -> Result<Fr>
{
    let parsed = BigUint::parse_bytes(value.trim().as_bytes(), 10)
        .ok_or_else(|| InputError::InvalidDecimal(value.to_string()))?;
    biguint_to_fr(&parsed)
}

pub fn fr_to_decimal(value: &Fr) -> String
{
    fr_to_biguint(value).to_str_radix(10)
}

pub fn fr_to_usize(value: &Fr) -> Option<usize>
{
    fr_to_biguint(value).to_usize()
}

/// Big-endian encoding of a field element, left padded to 32 bytes.
pub fn fr_to_be_bytes(value: &Fr) -> [u8; 32]
{
    let bytes = value.into_bigint().to_bytes_be();
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    padded
}
