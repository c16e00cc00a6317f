//! Hash helpers shared by every tree, domain object and commitment.

pub mod poseidon;

use sha2::{Digest, Sha256};
use crate::error::Result;
use crate::types::{fr_to_be_bytes, Fr};
use ark_ff::PrimeField;

pub use poseidon::{Poseidon, PoseidonHasher, MAX_X5_LEN};

/// Poseidon hash of an arbitrary number of elements (one to twelve).
pub fn hash_n(inputs: &[Fr]) -> Result<Fr>
{
    let mut hasher = Poseidon::new_circom(inputs.len())?;
    Ok(hasher.hash(inputs)?)
}

pub fn hash_left_right(left: Fr, right: Fr) -> Result<Fr>
{
    hash_n(&[left, right])
}

pub fn hash2(inputs: [Fr; 2]) -> Result<Fr>
{
    hash_n(&inputs)
}

pub fn hash3(inputs: [Fr; 3]) -> Result<Fr>
{
    hash_n(&inputs)
}

pub fn hash4(inputs: [Fr; 4]) -> Result<Fr>
{
    hash_n(&inputs)
}

pub fn hash5(inputs: [Fr; 5]) -> Result<Fr>
{
    hash_n(&inputs)
}

pub fn hash9(inputs: [Fr; 9]) -> Result<Fr>
{
    hash_n(&inputs)
}

/// Thirteen elements folded through three width-6 permutations:
/// `H5(e0, H5(e1..e6), H5(e6..e11), e11, e12)`.
pub fn hash13(inputs: [Fr; 13]) -> Result<Fr>
{
    let left = hash_n(&inputs[1..6])?;
    let right = hash_n(&inputs[6..11])?;
    hash5([inputs[0], left, right, inputs[11], inputs[12]])
}

/// SHA-256 over the 32-byte big-endian words of `values`, reduced into the field.
///
/// Matches `sha256(abi.encodePacked(uint256[]))` on the verifier side.
pub fn sha256_hash(values: &[Fr]) -> Fr
{
    let mut hasher = Sha256::new();
    for value in values
    {
        hasher.update(fr_to_be_bytes(value));
    }
    Fr::from_be_bytes_mod_order(&hasher.finalize())
}
