use crate::crypto::{cipher, eddsa, Ciphertext, Point, PrivateKey, PublicKey, Signature};
use crate::domain::message::{Message, MessageKind};
use crate::error::{InputError, Result};
use crate::hash::{hash4, hash9};
use crate::packing::{fr_to_u256, pack_slots, u256_to_fr, unpack_slots};
use crate::types::{Fr, MESSAGE_DATA_LENGTH};

const VOTE_PLAINTEXT_LENGTH: usize = 7;
const KEY_GEN_PLAINTEXT_LENGTH: usize = 9;

fn into_message_data(ciphertext: Vec<Fr>) -> Result<[Fr; MESSAGE_DATA_LENGTH]>
{
    let found = ciphertext.len();
    let data = ciphertext.try_into().map_err(|_| InputError::InvalidDataLength {
        expected: MESSAGE_DATA_LENGTH,
        found,
    })?;
    Ok(data)
}

/// A signed vote, possibly rotating the voter's key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteCommand
{
    pub state_index: u64,
    pub new_public_key: PublicKey,
    pub vote_option_index: u64,
    pub new_vote_weight: u64,
    pub nonce: u64,
    pub poll_id: u64,
    pub salt: Fr,
}

impl VoteCommand
{
    pub fn new(
        state_index: u64,
        new_public_key: PublicKey,
        vote_option_index: u64,
        new_vote_weight: u64,
        nonce: u64,
        poll_id: u64,
        salt: Fr,
    ) -> Result<Self>
    {
        let command = VoteCommand {
            state_index,
            new_public_key,
            vote_option_index,
            new_vote_weight,
            nonce,
            poll_id,
            salt,
        };
        command.packed()?;
        Ok(command)
    }

    /// The five small fields share one element, 50 bits each.
    fn packed(&self) -> Result<Fr>
    {
        let packed = pack_slots(&[
            self.state_index,
            self.vote_option_index,
            self.new_vote_weight,
            self.nonce,
            self.poll_id,
        ])?;
        Ok(u256_to_fr(packed))
    }

    pub fn as_array(&self) -> Result<[Fr; 4]>
    {
        Ok([self.packed()?, self.new_public_key.x(), self.new_public_key.y(), self.salt])
    }

    pub fn hash(&self) -> Result<Fr>
    {
        hash4(self.as_array()?)
    }

    pub fn sign(&self, private_key: &PrivateKey) -> Result<Signature>
    {
        eddsa::sign(private_key, self.hash()?)
    }

    pub fn verify_signature(&self, signature: &Signature, public_key: &PublicKey) -> bool
    {
        self.hash().map_or(false, |hash| eddsa::verify(hash, signature, public_key))
    }

    pub fn encrypt(&self, signature: &Signature, shared_key: &Point) -> Result<Message>
    {
        let [packed, x, y, salt] = self.as_array()?;
        let plaintext = [packed, x, y, salt, signature.r8.x, signature.r8.y, signature.s];
        let ciphertext = cipher::encrypt(&plaintext, shared_key, 0)?;
        Ok(Message::new(MessageKind::Vote, into_message_data(ciphertext)?))
    }

    pub fn decrypt(message: &Message, shared_key: &Point) -> Result<(VoteCommand, Signature)>
    {
        let plain = cipher::decrypt(&message.data, shared_key, 0, VOTE_PLAINTEXT_LENGTH)?;

        // Bits above the fifth slot are ignored, as the circuit does.
        let slots = unpack_slots(fr_to_u256(&plain[0]), 5);
        let command = VoteCommand {
            state_index: slots[0],
            new_public_key: PublicKey::new(Point::new(plain[1], plain[2])),
            vote_option_index: slots[1],
            new_vote_weight: slots[2],
            nonce: slots[3],
            poll_id: slots[4],
            salt: plain[3],
        };
        let signature = Signature { r8: Point::new(plain[4], plain[5]), s: plain[6] };

        Ok((command, signature))
    }
}

/// Credits voice credits to a signup. Carried in the clear.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopUpCommand
{
    pub state_index: Fr,
    pub amount: Fr,
    pub poll_id: u64,
}

impl TopUpCommand
{
    pub fn from_message(message: &Message, poll_id: u64) -> Self
    {
        TopUpCommand { state_index: message.data[0], amount: message.data[1], poll_id }
    }
}

/// Replaces a deactivated key with a fresh one, proving the deactivation
/// through a rerandomized ciphertext and a nullifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyGenCommand
{
    pub new_public_key: PublicKey,
    pub new_credit_balance: Fr,
    pub nullifier: Fr,
    pub c1r: Point,
    pub c2r: Point,
    pub poll_id: Fr,

    /// Slot assigned on chain; not part of the encrypted payload.
    pub new_state_index: u64,
}

impl KeyGenCommand
{
    pub fn new(
        new_public_key: PublicKey,
        new_credit_balance: Fr,
        nullifier: Fr,
        rerandomized: Ciphertext,
        poll_id: u64,
    ) -> Self
    {
        KeyGenCommand {
            new_public_key,
            new_credit_balance,
            nullifier,
            c1r: rerandomized.c1,
            c2r: rerandomized.c2,
            poll_id: Fr::from(poll_id),
            new_state_index: 0,
        }
    }

    pub fn rerandomized(&self) -> Ciphertext
    {
        Ciphertext { c1: self.c1r, c2: self.c2r }
    }

    pub fn as_array(&self) -> [Fr; 9]
    {
        [
            self.new_public_key.x(),
            self.new_public_key.y(),
            self.new_credit_balance,
            self.nullifier,
            self.c1r.x,
            self.c1r.y,
            self.c2r.x,
            self.c2r.y,
            self.poll_id,
        ]
    }

    pub fn hash(&self) -> Result<Fr>
    {
        hash9(self.as_array())
    }

    pub fn encrypt(&self, shared_key: &Point) -> Result<Message>
    {
        let ciphertext = cipher::encrypt(&self.as_array(), shared_key, 0)?;
        Ok(Message::new(MessageKind::KeyGen, into_message_data(ciphertext)?))
    }

    pub fn decrypt(message: &Message, shared_key: &Point) -> Result<KeyGenCommand>
    {
        let plain = cipher::decrypt(&message.data, shared_key, 0, KEY_GEN_PLAINTEXT_LENGTH)?;

        Ok(KeyGenCommand {
            new_public_key: PublicKey::new(Point::new(plain[0], plain[1])),
            new_credit_balance: plain[2],
            nullifier: plain[3],
            c1r: Point::new(plain[4], plain[5]),
            c2r: Point::new(plain[6], plain[7]),
            poll_id: plain[8],
            new_state_index: 0,
        })
    }
}

/// A decrypted message, one variant per message type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command
{
    Vote(VoteCommand, Signature),
    TopUp(TopUpCommand),
    KeyGen(KeyGenCommand),

    /// Substituted for a message that could not be decrypted.
    Placeholder(MessageKind),
}

impl Command
{
    pub fn kind(&self) -> MessageKind
    {
        match self
        {
            Command::Vote(..) => MessageKind::Vote,
            Command::TopUp(_) => MessageKind::TopUp,
            Command::KeyGen(_) => MessageKind::KeyGen,
            Command::Placeholder(kind) => *kind,
        }
    }

    /// The extra circuit input appended to every message.
    pub fn new_state_index(&self) -> u64
    {
        match self
        {
            Command::KeyGen(command) => command.new_state_index,
            _ => 0,
        }
    }
}
