//! Value types shared by the signup registry and the polls.

pub mod ballot;
pub mod commands;
pub mod deactivated;
pub mod message;
pub mod signup_leaf;

pub use ballot::Ballot;
pub use commands::{Command, KeyGenCommand, TopUpCommand, VoteCommand};
pub use deactivated::{DeactivatedKeyEvent, DeactivatedKeyLeaf};
pub use message::{Message, MessageKind};
pub use signup_leaf::SignupLeaf;
