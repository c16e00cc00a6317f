//! The cryptographic capability consumed by the engine: keys and ECDH,
//! EdDSA-Poseidon signatures, the Poseidon cipher and ElGamal.

pub mod babyjub;
pub mod cipher;
pub mod eddsa;
pub mod elgamal;
pub mod keys;

pub use babyjub::Point;
pub use eddsa::Signature;
pub use elgamal::Ciphertext;
pub use keys::{gen_ecdh_shared_key, Keypair, PrivateKey, PublicKey, SaltGenerator};
