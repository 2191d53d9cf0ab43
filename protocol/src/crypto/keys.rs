//! # Key Management
//!
//! Ed25519 keypairs for Coffer identities.
//!
//! An identity's [`Address`] is its raw 32-byte Ed25519 public key, which
//! means every keyed address lies on the curve. Program-derived addresses
//! (vault records, token accounts) are deliberately off the curve, so no
//! keypair can ever sign for them. See [`crate::identity`].
//!
//! Signature checks belong to the execution substrate that presents the
//! caller identity to the vault engine; this module only mints identities.
//! Private keys are zeroized on drop and never logged.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use std::fmt;

use crate::identity::Address;

/// An identity keypair wrapping an Ed25519 signing key.
///
/// Intentionally not `Serialize`: persisting a private key should be a
/// deliberate act, not a side effect of dumping a struct to JSON.
pub struct CofferKeypair {
    signing_key: SigningKey,
}

impl CofferKeypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a keypair deterministically from a 32-byte seed.
    ///
    /// Useful for fixtures that need stable identities across runs. A weak
    /// seed gives a weak key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The address of this identity.
    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }
}

impl fmt::Debug for CofferKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CofferKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
