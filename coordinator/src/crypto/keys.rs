//! Key material, the ECDH shared secret and the engine's source of salts.

use std::collections::HashSet;
use blake_hash::{Blake512, Digest};
use num_bigint::BigUint;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use tracing::warn;
use crate::crypto::babyjub::Point;
use crate::error::{CryptoError, Result};
use crate::hash::hash2;
use crate::types::{
    biguint_to_fr,
    biguint_to_fr_mod_order,
    fr_to_be_bytes,
    modulus,
    Fr,
    PAD_KEY_X,
    PAD_KEY_Y
};

/// Clears the cofactor bits and fixes the top bit of a 32-byte scalar buffer.
pub(crate) fn prune_buffer(bytes: &[u8]) -> [u8; 32]
{
    let mut pruned = [0u8; 32];
    pruned.copy_from_slice(&bytes[..32]);
    pruned[0] &= 0xf8;
    pruned[31] &= 0x7f;
    pruned[31] |= 0x40;
    pruned
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrivateKey(Fr);

impl PrivateKey
{
    pub fn new(raw: Fr) -> Self
    {
        PrivateKey(raw)
    }

    pub fn raw(&self) -> Fr
    {
        self.0
    }

    /// 512-bit digest of the big-endian key bytes. The first half seeds the
    /// signing scalar, the second half the signature nonce.
    pub(crate) fn digest(&self) -> [u8; 64]
    {
        let mut digest = [0u8; 64];
        digest.copy_from_slice(&Blake512::digest(&fr_to_be_bytes(&self.0)[..]));
        digest
    }

    /// The scalar multiplied into the generator to obtain the public key.
    pub fn formatted(&self) -> BigUint
    {
        let pruned = prune_buffer(&self.digest()[..32]);
        BigUint::from_bytes_le(&pruned) >> 3
    }

    pub fn as_circuit_input(&self) -> Fr
    {
        biguint_to_fr_mod_order(&self.formatted())
    }

    pub fn public_key(&self) -> PublicKey
    {
        PublicKey(Point::BASE8.mul_scalar(&self.formatted()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey(Point);

impl PublicKey
{
    pub fn new(point: Point) -> Self
    {
        PublicKey(point)
    }

    /// Builds a key from untrusted coordinates. Curve membership is checked
    /// lazily by the operations that need it.
    pub fn from_raw(x: &BigUint, y: &BigUint) -> Result<Self>
    {
        Ok(PublicKey(Point::new(biguint_to_fr(x)?, biguint_to_fr(y)?)))
    }

    /// The nothing-up-my-sleeve key of blank leaves and top-up messages.
    pub fn pad_key() -> Self
    {
        PublicKey(Point::new(PAD_KEY_X, PAD_KEY_Y))
    }

    pub fn point(&self) -> &Point
    {
        &self.0
    }

    pub fn x(&self) -> Fr
    {
        self.0.x
    }

    pub fn y(&self) -> Fr
    {
        self.0.y
    }

    pub fn as_array(&self) -> [Fr; 2]
    {
        self.0.as_array()
    }

    pub fn hash(&self) -> Result<Fr>
    {
        hash2(self.as_array())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keypair
{
    pub private_key: PrivateKey,

    pub public_key: PublicKey,
}

impl Keypair
{
    pub fn from_private_key(private_key: PrivateKey) -> Self
    {
        Keypair { private_key, public_key: private_key.public_key() }
    }

    pub fn random<R: RngCore>(rng: &mut R) -> Self
    {
        Self::from_private_key(PrivateKey::new(gen_random_babyjub_value(rng)))
    }
}

/// Derives the point shared between `private_key`'s owner and `public_key`'s owner.
pub fn gen_ecdh_shared_key(private_key: &PrivateKey, public_key: &PublicKey) -> Result<Point, CryptoError>
{
    if !public_key.point().in_curve() { Err(CryptoError::NotOnCurve)? }
    Ok(public_key.point().mul_scalar(&private_key.formatted()))
}

/// A uniformly random field element, by rejection sampling 254-bit integers.
pub fn gen_random_babyjub_value<R: RngCore>(rng: &mut R) -> Fr
{
    let modulus = modulus();
    loop
    {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        bytes[31] &= 0x3f;

        let candidate = BigUint::from_bytes_le(&bytes);
        if candidate < modulus { return biguint_to_fr_mod_order(&candidate); }
    }
}

/// Hands out salts, masks and ephemeral keys. No value is issued twice
/// during the generator's lifetime.
#[derive(Clone, Debug)]
pub struct SaltGenerator
{
    rng: StdRng,

    issued: HashSet<Fr>,
}

impl SaltGenerator
{
    pub fn from_entropy() -> Self
    {
        SaltGenerator { rng: StdRng::from_entropy(), issued: HashSet::new() }
    }

    /// A reproducible stream, for replays that must re-derive identical records.
    pub fn from_seed(seed: u64) -> Self
    {
        SaltGenerator { rng: StdRng::seed_from_u64(seed), issued: HashSet::new() }
    }

    pub fn next_salt(&mut self) -> Fr
    {
        loop
        {
            let salt = gen_random_babyjub_value(&mut self.rng);
            if self.issued.insert(salt) { return salt; }
            warn!("discarding repeated random value");
        }
    }

    pub fn next_keypair(&mut self) -> Keypair
    {
        Keypair::from_private_key(PrivateKey::new(self.next_salt()))
    }
}
