//! Additively homomorphic ElGamal over Baby Jubjub, used to hide whether a
//! deactivation request was accepted.

use num_bigint::BigUint;
use crate::crypto::babyjub::Point;
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::error::CryptoError;
use crate::types::Fr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ciphertext
{
    pub c1: Point,

    pub c2: Point,
}

impl Ciphertext
{
    pub fn as_arrays(&self) -> [[Fr; 2]; 2]
    {
        [self.c1.as_array(), self.c2.as_array()]
    }
}

/// 0 maps to the identity and 1 to the generator.
pub fn bit_to_curve(bit: bool) -> Point
{
    if bit { Point::BASE8 } else { Point::IDENTITY }
}

pub fn curve_to_bit(point: &Point) -> Result<bool, CryptoError>
{
    if point.is_identity() { return Ok(false); }
    if *point == Point::BASE8 { return Ok(true); }
    Err(CryptoError::InvalidBit)
}

pub fn encrypt(public_key: &PublicKey, message: &Point, randomness: &BigUint) -> Ciphertext
{
    Ciphertext {
        c1: Point::BASE8.mul_scalar(randomness),
        c2: message.add(&public_key.point().mul_scalar(randomness)),
    }
}

pub fn decrypt(private_key: &PrivateKey, ciphertext: &Ciphertext) -> Result<Point, CryptoError>
{
    if !ciphertext.c1.in_curve() || !ciphertext.c2.in_curve() { Err(CryptoError::NotOnCurve)? }

    let shared = ciphertext.c1.mul_scalar(&private_key.formatted());
    Ok(ciphertext.c2.add(&shared.negate()))
}

pub fn encrypt_bit(public_key: &PublicKey, bit: bool, randomness: &BigUint) -> Ciphertext
{
    encrypt(public_key, &bit_to_curve(bit), randomness)
}

pub fn decrypt_bit(private_key: &PrivateKey, ciphertext: &Ciphertext) -> Result<bool, CryptoError>
{
    curve_to_bit(&decrypt(private_key, ciphertext)?)
}

/// Adds a fresh encryption of the identity, leaving the plaintext unchanged.
pub fn rerandomize(public_key: &PublicKey, randomness: &BigUint, ciphertext: &Ciphertext) -> Ciphertext
{
    Ciphertext {
        c1: Point::BASE8.mul_scalar(randomness).add(&ciphertext.c1),
        c2: public_key.point().mul_scalar(randomness).add(&ciphertext.c2),
    }
}
