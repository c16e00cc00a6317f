//! EdDSA over Baby Jubjub with Poseidon as the challenge hash.

use blake_hash::{Blake512, Digest};
use num_bigint::BigUint;
use crate::crypto::babyjub::{sub_order, Point};
use crate::crypto::keys::{prune_buffer, PrivateKey, PublicKey};
use crate::error::Result;
use crate::hash::hash5;
use crate::types::{biguint_to_fr_mod_order, fr_to_biguint, Fr};
use ark_ff::{BigInteger, PrimeField};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature
{
    /// The commitment point `r·B8`.
    pub r8: Point,

    /// The response scalar, reduced modulo the subgroup order.
    pub s: Fr,
}

fn challenge(r8: &Point, public_key: &PublicKey, message: Fr) -> Result<BigUint>
{
    let hm = hash5([r8.x, r8.y, public_key.x(), public_key.y(), message])?;
    Ok(fr_to_biguint(&hm))
}

pub fn sign(private_key: &PrivateKey, message: Fr) -> Result<Signature>
{
    let digest = private_key.digest();
    let s = BigUint::from_bytes_le(&prune_buffer(&digest[..32]));

    let mut nonce_input = digest[32..].to_vec();
    nonce_input.extend_from_slice(&message.into_bigint().to_bytes_le());
    let r = BigUint::from_bytes_le(&Blake512::digest(&nonce_input[..])) % sub_order();

    let r8 = Point::BASE8.mul_scalar(&r);
    let public_key = private_key.public_key();
    let hm = challenge(&r8, &public_key, message)?;

    let response = (r + hm * s) % sub_order();

    Ok(Signature { r8, s: biguint_to_fr_mod_order(&response) })
}

/// Never fails: malformed keys or signatures simply do not verify.
pub fn verify(message: Fr, signature: &Signature, public_key: &PublicKey) -> bool
{
    if !signature.r8.in_curve() || !public_key.point().in_curve() { return false; }

    let s = fr_to_biguint(&signature.s);
    if s >= *sub_order() { return false; }

    let Ok(hm) = challenge(&signature.r8, public_key, message) else { return false };

    let left = Point::BASE8.mul_scalar(&s);
    let right = signature.r8.add(&public_key.point().mul_scalar(&(hm * 8u32)));

    left == right
}
