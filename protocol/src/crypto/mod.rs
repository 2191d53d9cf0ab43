//! # Cryptography
//!
//! The small set of primitives the vault engine needs: SHA-256 for address
//! derivation and Ed25519 keypairs for identities. Nothing here is
//! hand-rolled; `sha2` and `ed25519-dalek` do the real work.

pub mod hash;
pub mod keys;

pub use hash::{hashv, sha256, HASH_LENGTH};
pub use keys::CofferKeypair;
