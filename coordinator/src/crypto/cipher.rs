//! Poseidon duplex-sponge encryption over vectors of field elements.
//!
//! The sponge has width four: one capacity lane and three rate lanes. The
//! ciphertext of `n` elements holds `3·⌈n/3⌉ + 1` elements, the last one
//! authenticating the whole stream.

use ark_ff::Zero;
use crate::crypto::babyjub::Point;
use crate::error::{CryptoError, Result};
use crate::hash::Poseidon;
use crate::types::Fr;

const WIDTH: usize = 4;
const RATE: usize = 3;

fn initial_state(shared_key: &Point, nonce: u128, length: usize) -> [Fr; WIDTH]
{
    let two_128 = Fr::from(u128::MAX) + Fr::from(1u64);
    let domain = Fr::from(nonce) + Fr::from(length as u64) * two_128;
    [Fr::zero(), shared_key.x, shared_key.y, domain]
}

pub fn ciphertext_length(plaintext_length: usize) -> usize
{
    plaintext_length.div_ceil(RATE) * RATE + 1
}

pub fn encrypt(plaintext: &[Fr], shared_key: &Point, nonce: u128) -> Result<Vec<Fr>>
{
    let mut padded = plaintext.to_vec();
    while padded.len() % RATE != 0 { padded.push(Fr::zero()); }

    let mut permutation = Poseidon::with_width(WIDTH)?;
    let mut state = initial_state(shared_key, nonce, plaintext.len()).to_vec();
    let mut ciphertext = Vec::with_capacity(padded.len() + 1);

    for block in padded.chunks(RATE)
    {
        state = permutation.permute(&state)?;
        for (lane, element) in block.iter().enumerate()
        {
            state[lane + 1] += element;
            ciphertext.push(state[lane + 1]);
        }
    }

    state = permutation.permute(&state)?;
    ciphertext.push(state[1]);

    Ok(ciphertext)
}

/// Inverts [`encrypt`]. Any mismatch in length, padding or the trailing
/// authentication element is reported as [`CryptoError::DecryptFailure`].
pub fn decrypt(ciphertext: &[Fr], shared_key: &Point, nonce: u128, length: usize) -> Result<Vec<Fr>>
{
    if ciphertext.len() != ciphertext_length(length) { Err(CryptoError::DecryptFailure)? }

    let mut permutation = Poseidon::with_width(WIDTH)?;
    let mut state = initial_state(shared_key, nonce, length).to_vec();
    let mut plaintext = Vec::with_capacity(ciphertext.len() - 1);

    for block in ciphertext[..ciphertext.len() - 1].chunks(RATE)
    {
        state = permutation.permute(&state)?;
        for (lane, element) in block.iter().enumerate()
        {
            plaintext.push(*element - state[lane + 1]);
            state[lane + 1] = *element;
        }
    }

    if plaintext[length..].iter().any(|padding| !padding.is_zero()) { Err(CryptoError::DecryptFailure)? }

    state = permutation.permute(&state)?;
    if ciphertext[ciphertext.len() - 1] != state[1] { Err(CryptoError::DecryptFailure)? }

    plaintext.truncate(length);
    Ok(plaintext)
}
