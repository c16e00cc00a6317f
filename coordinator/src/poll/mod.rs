//! A single voting round: message ingestion, batch replay, key deactivation
//! and the records handed to the provers.

pub mod deactivation;
pub mod inputs;
#[allow(clippy::module_inception)]
pub mod poll;
pub mod process;
pub mod provider;
pub mod tally;

pub use inputs::{
    DeactivationInputs,
    DeactivationOutput,
    NewKeyInputs,
    NewKeyOutput,
    ProcessMessagesInputs
};
pub use poll::{Poll, ProcessingPhase, Snapshot};
pub use process::NoOp;
pub use provider::PollProvider;
pub use tally::gen_tally_result_commitment;
