//! Error taxonomy of the coordinator engine.
//!
//! Only fatal conditions are represented here. Undecryptable messages and
//! protocol-rejected commands are ordinary values handled inside a batch.

use light_poseidon::PoseidonError;
use thiserror::Error;
use crate::types::PollId;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error
{
    /// The call was rejected before any state was mutated.
    #[error("input validation failed: {0}")]
    InputValidation(#[from] InputError),

    /// Calls were made out of sequence.
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolViolation),

    /// A root or path was requested before it could exist.
    #[error("proof precondition unmet: {0}")]
    ProofPrecondition(#[from] ProofPrecondition),

    #[error("merkle tree: {0}")]
    Tree(#[from] TreeError),

    #[error("poseidon: {0}")]
    Hash(#[from] PoseidonError),

    #[error("crypto: {0}")]
    Crypto(#[from] CryptoError),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError
{
    #[error("value is not below the snark field modulus")]
    NotInField,

    #[error("invalid decimal integer {0:?}")]
    InvalidDecimal(String),

    #[error("expected message type {expected}, found {found}")]
    UnexpectedMessageType { expected: u64, found: u64 },

    #[error("unknown message type {0}")]
    UnknownMessageType(String),

    #[error("expected {expected} data elements, found {found}")]
    InvalidDataLength { expected: usize, found: usize },

    #[error("value does not fit in a {bits}-bit slot")]
    SlotOverflow { bits: usize },

    #[error("packed value exceeds its {bits}-bit budget")]
    PackedOverflow { bits: usize },

    #[error("state index {index} is not a signup slot")]
    InvalidStateIndex { index: usize },

    #[error("deactivated key was never recorded")]
    UnknownDeactivatedKey,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolViolation
{
    #[error("cannot merge a queue without leaves")]
    EmptyQueue,

    #[error("sub-roots are already merged")]
    SubRootsAlreadyMerged,

    #[error("sub-roots must be merged first")]
    SubRootsNotMerged,

    #[error("cannot enqueue once merging has started")]
    EnqueueAfterMerge,

    #[error("cannot merge to depth {depth}, minimum is {min}")]
    DepthTooSmall { depth: u8, min: u8 },

    #[error("message queue root does not match the message tree")]
    MessagesNotMerged,

    #[error("state queue root does not match the state tree")]
    StateNotMerged,

    #[error("no unprocessed messages remain")]
    NoUnprocessedMessages,

    #[error("poll {active} is being processed, poll {requested} must wait")]
    PollBusy { active: PollId, requested: PollId },

    #[error("poll {0} does not hold the processing token")]
    TokenNotHeld(PollId),

    #[error("deactivation messages were already processed")]
    DeactivationAlreadyProcessed,

    #[error("{count} deactivation messages exceed the queue size {capacity}")]
    DeactivationQueueOverflow { count: usize, capacity: usize },

    #[error("message limit {0} reached")]
    MessageLimitReached(usize),

    #[error("{signups} signups exceed the supported {limit}")]
    SignupLimitExceeded { signups: usize, limit: usize },

    #[error("poll {0} does not exist")]
    UnknownPoll(PollId),

    #[error("poll {0} is a null poll")]
    NullPoll(PollId),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProofPrecondition
{
    #[error("no root has been merged at depth {0}")]
    RootNotMerged(u8),

    #[error("sub-tree {0} has not been archived")]
    SubRootNotArchived(usize),

    #[error("signup state has not been snapshotted")]
    MissingSnapshot,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TreeError
{
    #[error("tree is full")]
    Full,

    #[error("index {index} exceeds capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },

    #[error("leaf {index} has not been inserted yet")]
    UnfilledLeaf { index: usize },

    #[error("span {start}..{end} is not sub-tree aligned")]
    UnalignedSpan { start: usize, end: usize },

    #[error("unsupported arity {0}")]
    UnsupportedArity(usize),

    #[error("depth {0} is not supported")]
    UnsupportedDepth(u8),

    #[error("key already present")]
    KeyExists,

    #[error("node missing from storage")]
    MissingNode,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CryptoError
{
    #[error("ciphertext failed to decrypt")]
    DecryptFailure,

    #[error("point is not on the curve")]
    NotOnCurve,

    #[error("point does not encode a bit")]
    InvalidBit,
}
