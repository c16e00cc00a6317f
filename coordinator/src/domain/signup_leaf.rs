use crate::crypto::PublicKey;
use crate::error::Result;
use crate::hash::hash4;
use crate::types::Fr;

/// A leaf of the signup tree, mapping a public key to its voice credits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignupLeaf
{
    pub public_key: PublicKey,
    pub voice_credit_balance: Fr,
    pub timestamp: Fr,
}

impl SignupLeaf
{
    pub fn new(public_key: PublicKey, voice_credit_balance: Fr, timestamp: Fr) -> Self
    {
        SignupLeaf { public_key, voice_credit_balance, timestamp }
    }

    /// The leaf occupying slot zero of every signup tree. Its key is the
    /// first Pedersen base point, for which no private key is known.
    pub fn blank() -> Self
    {
        SignupLeaf::new(PublicKey::pad_key(), Fr::from(0u64), Fr::from(0u64))
    }

    pub fn as_array(&self) -> [Fr; 4]
    {
        [self.public_key.x(), self.public_key.y(), self.voice_credit_balance, self.timestamp]
    }

    pub fn hash(&self) -> Result<Fr>
    {
        hash4(self.as_array())
    }
}
