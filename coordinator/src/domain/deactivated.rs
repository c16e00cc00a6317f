use crate::crypto::{Ciphertext, PublicKey};
use crate::error::Result;
use crate::hash::{hash3, hash5};
use crate::types::Fr;

/// A leaf of the deactivated-keys tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeactivatedKeyLeaf
{
    pub public_key: PublicKey,

    /// ElGamal encryption of the deactivation status bit.
    pub ciphertext: Ciphertext,

    pub salt: Fr,
}

impl DeactivatedKeyLeaf
{
    pub fn new(public_key: PublicKey, ciphertext: Ciphertext, salt: Fr) -> Self
    {
        DeactivatedKeyLeaf { public_key, ciphertext, salt }
    }

    /// Hides the key behind the salt so the leaf can be published.
    pub fn key_hash(&self) -> Result<Fr>
    {
        deactivated_key_hash(&self.public_key, self.salt)
    }

    pub fn as_array(&self) -> Result<[Fr; 5]>
    {
        let [[c1x, c1y], [c2x, c2y]] = self.ciphertext.as_arrays();
        Ok([self.key_hash()?, c1x, c1y, c2x, c2y])
    }

    pub fn hash(&self) -> Result<Fr>
    {
        hash5(self.as_array()?)
    }

    pub fn event(&self) -> Result<DeactivatedKeyEvent>
    {
        Ok(DeactivatedKeyEvent { key_hash: self.key_hash()?, ciphertext: self.ciphertext })
    }
}

pub fn deactivated_key_hash(public_key: &PublicKey, salt: Fr) -> Result<Fr>
{
    hash3([public_key.x(), public_key.y(), salt])
}

/// The public trace of a deactivation as emitted on chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeactivatedKeyEvent
{
    pub key_hash: Fr,
    pub ciphertext: Ciphertext,
}

impl DeactivatedKeyEvent
{
    /// Equals the hash of the leaf the event was derived from.
    pub fn leaf_hash(&self) -> Result<Fr>
    {
        let [[c1x, c1y], [c2x, c2y]] = self.ciphertext.as_arrays();
        hash5([self.key_hash, c1x, c1y, c2x, c2y])
    }
}
