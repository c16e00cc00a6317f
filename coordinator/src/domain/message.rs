use num_bigint::BigUint;
use num_traits::ToPrimitive;
use crate::crypto::PublicKey;
use crate::error::{InputError, Result};
use crate::hash::hash13;
use crate::types::{biguint_to_fr, Fr, MESSAGE_DATA_LENGTH};

/// The closed set of message types a poll accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind
{
    Vote,
    TopUp,
    KeyGen,
}

impl MessageKind
{
    pub fn tag(&self) -> u64
    {
        match self
        {
            MessageKind::Vote => 1,
            MessageKind::TopUp => 2,
            MessageKind::KeyGen => 3,
        }
    }

    pub fn from_tag(tag: u64) -> Option<Self>
    {
        match tag
        {
            1 => Some(MessageKind::Vote),
            2 => Some(MessageKind::TopUp),
            3 => Some(MessageKind::KeyGen),
            _ => None,
        }
    }
}

/// An encrypted command as published on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message
{
    pub kind: MessageKind,
    pub data: [Fr; MESSAGE_DATA_LENGTH],
}

impl Message
{
    pub fn new(kind: MessageKind, data: [Fr; MESSAGE_DATA_LENGTH]) -> Self
    {
        Message { kind, data }
    }

    /// Builds a message from unreduced integers, rejecting anything that is
    /// not a field element.
    pub fn from_raw(kind: &BigUint, data: &[BigUint]) -> Result<Self>
    {
        let kind = kind
            .to_u64()
            .and_then(MessageKind::from_tag)
            .ok_or_else(|| InputError::UnknownMessageType(kind.to_string()))?;

        if data.len() != MESSAGE_DATA_LENGTH
        {
            Err(InputError::InvalidDataLength { expected: MESSAGE_DATA_LENGTH, found: data.len() })?
        }

        let mut elements = [Fr::from(0u64); MESSAGE_DATA_LENGTH];
        for (element, value) in elements.iter_mut().zip(data)
        {
            *element = biguint_to_fr(value)?;
        }

        Ok(Message::new(kind, elements))
    }

    /// The all-zero vote used to fill incomplete batches.
    pub fn padding() -> Self
    {
        Message::new(MessageKind::Vote, [Fr::from(0u64); MESSAGE_DATA_LENGTH])
    }

    pub fn as_array(&self) -> [Fr; MESSAGE_DATA_LENGTH + 1]
    {
        let mut array = [Fr::from(0u64); MESSAGE_DATA_LENGTH + 1];
        array[0] = Fr::from(self.kind.tag());
        array[1..].copy_from_slice(&self.data);
        array
    }

    /// The message leaf: the type, the data and the ephemeral key.
    pub fn hash(&self, enc_pub_key: &PublicKey) -> Result<Fr>
    {
        let mut inputs = [Fr::from(0u64); 13];
        inputs[..MESSAGE_DATA_LENGTH + 1].copy_from_slice(&self.as_array());
        inputs[MESSAGE_DATA_LENGTH + 1..].copy_from_slice(&enc_pub_key.as_array());
        hash13(inputs)
    }
}
