//! # Identity Module
//!
//! Who is who in Coffer. Identities and accounts share one address space:
//!
//! 1. **Keyed addresses**: an Ed25519 public key. Owners, delegates and
//!    multisig signers are keyed addresses.
//! 2. **Derived addresses**: off-curve SHA-256 digests of seeds plus the
//!    program id. Vault records and token accounts are derived, so nobody
//!    holds a key for them.
//!
//! Base58 is the human rendering for both, which keeps addresses pasteable
//! into the same wallets that already speak that format.

pub mod address;
pub mod seeds;

pub use address::{Address, AddressError, ADDRESS_LENGTH};
pub use seeds::{associated_token_address, vault_address};
