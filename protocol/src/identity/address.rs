//! # Addresses
//!
//! Every participant and every account in Coffer is named by a 32-byte
//! [`Address`], rendered as Base58 for humans:
//!
//! ```text
//! keyed address    = ed25519 public key           (on the curve)
//! derived address  = sha256(seeds ++ [bump] ++ program_id ++ MARKER)
//!                    with the first bump (255 -> 0) whose digest is
//!                    NOT a valid curve point
//! ```
//!
//! Derived addresses have no private key. That is the whole point: a vault
//! record or a vault-owned token account can only be moved by the program
//! that derived it, never by someone holding a key.

use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::crypto::hash::hashv;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 32;

/// Longest Base58 rendering of a 32-byte value.
const MAX_BASE58_LENGTH: usize = 44;

/// Maximum number of seeds accepted by address derivation.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single derivation seed.
pub const MAX_SEED_LENGTH: usize = 32;

/// Domain-separation suffix for derived addresses.
const DERIVED_ADDRESS_MARKER: &[u8] = b"ProgramDerivedAddress";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced when parsing or deriving addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The string is not valid Base58.
    #[error("invalid base58 address: {0}")]
    InvalidBase58(String),

    /// The decoded value is not 32 bytes.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Decoded length.
        got: usize,
    },

    /// Too many seeds, or a seed longer than [`MAX_SEED_LENGTH`].
    #[error("derivation seeds exceed limits (fewer than 16 seeds, at most 32 bytes each)")]
    SeedsTooLong,

    /// The candidate digest is a valid curve point, so it could have a key.
    #[error("derived address falls on the ed25519 curve")]
    OnCurve,

    /// No bump in `0..=255` produced an off-curve address.
    #[error("no viable bump seed found")]
    NoViableBump,
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account or identity address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns a process-unique address.
    ///
    /// Handy for fixtures (mints, throwaway identities). The values are
    /// predictable and carry no key, so never use them for anything real.
    pub fn new_unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[..8].copy_from_slice(&n.to_be_bytes());
        bytes[8..16].copy_from_slice(b"fixture!");
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Copy out the raw bytes.
    pub fn to_bytes(self) -> [u8; ADDRESS_LENGTH] {
        self.0
    }

    /// `true` if these bytes decompress to an ed25519 point, i.e. someone
    /// could in principle hold the matching private key.
    pub fn is_on_curve(&self) -> bool {
        CompressedEdwardsY(self.0).decompress().is_some()
    }

    /// Derive an address from `seeds` and a single explicit bump.
    ///
    /// Fails with [`AddressError::OnCurve`] when the digest happens to be
    /// a valid point. Most callers want [`Address::find_program_address`].
    pub fn create_program_address(
        seeds: &[&[u8]],
        bump: u8,
        program_id: &Address,
    ) -> Result<Address, AddressError> {
        if seeds.len() >= MAX_SEEDS || seeds.iter().any(|s| s.len() > MAX_SEED_LENGTH) {
            return Err(AddressError::SeedsTooLong);
        }

        let bump_seed = [bump];
        let mut parts: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 3);
        parts.extend_from_slice(seeds);
        parts.push(&bump_seed);
        parts.push(program_id.as_bytes());
        parts.push(DERIVED_ADDRESS_MARKER);

        let candidate = Address(hashv(&parts));
        if candidate.is_on_curve() {
            return Err(AddressError::OnCurve);
        }
        Ok(candidate)
    }

    /// Find the canonical derived address for `seeds`: the first bump,
    /// counting down from 255, whose digest is off the curve.
    pub fn find_program_address(
        seeds: &[&[u8]],
        program_id: &Address,
    ) -> Result<(Address, u8), AddressError> {
        for bump in (0..=u8::MAX).rev() {
            match Self::create_program_address(seeds, bump, program_id) {
                Ok(address) => return Ok((address, bump)),
                Err(AddressError::OnCurve) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(AddressError::NoViableBump)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LENGTH {
            return Err(AddressError::InvalidBase58(format!(
                "{} characters is too long",
                s.len()
            )));
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
        let array: [u8; ADDRESS_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: ADDRESS_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(array))
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Base58 strings in JSON, raw bytes in binary formats.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; ADDRESS_LENGTH]>::deserialize(deserializer).map(Address)
        }
    }
}
