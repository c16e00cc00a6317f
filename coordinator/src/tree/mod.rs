//! Merkle structures backing signups, messages, ballots and nullifiers.

pub mod incremental;
pub mod queue;
pub mod sparse;

pub use incremental::{IncrementalTree, MerklePath};
pub use queue::AccQueue;
pub use sparse::{SmtProof, SparseMerkleTree};
