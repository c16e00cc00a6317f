//! Off-chain coordinator engine for collusion resistant zero-knowledge voting.
//!
//! Signups accumulate in a [`MaciState`]. Each deployed [`Poll`] collects
//! encrypted messages, snapshots the signup set on first processing and then
//! replays its messages in reverse order, one fixed-size batch at a time,
//! emitting the exact inputs expected by the processing circuits.

pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod hash;
pub mod packing;
pub mod poll;
pub mod state;
pub mod tree;
pub mod types;


pub use config::{BatchSizes, MaxValues, PollConfiguration, TreeDepths, VoiceCreditModel};
pub use error::{Error, Result};
pub use poll::Poll;
pub use state::{MaciState, ProcessingToken, SignupRegistry};
pub use types::{Fr, PollId};
