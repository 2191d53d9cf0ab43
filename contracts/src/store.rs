//! # Vault Account Store
//!
//! Vault records persist as opaque byte blobs keyed by their derived
//! address, the same way an account database would hold them:
//!
//! | Key                   | Value                              |
//! |-----------------------|------------------------------------|
//! | vault address (32B)   | `[schema version] ++ bincode(Vault)` |
//!
//! The store sees bytes only. Encoding happens in [`Vault::encode`], before
//! any token moves, so the final write of an instruction cannot fail on a
//! serialization error.

use std::collections::HashMap;

use coffer_protocol::identity::Address;
use thiserror::Error;

use crate::state::Vault;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by a [`VaultStore`] or by record encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Serializing a record failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Stored bytes are not a valid record.
    #[error("decode error: {0}")]
    Decode(String),

    /// The record was written by an incompatible schema.
    #[error("unsupported schema version {got} (expected {expected})")]
    SchemaVersion {
        /// Version this build understands.
        expected: u8,
        /// Version found in the record.
        got: u8,
    },

    /// A zero-length record.
    #[error("empty account data")]
    Empty,

    /// The backing store failed.
    #[error("backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// VaultStore
// ---------------------------------------------------------------------------

/// Byte-level account storage for vault records.
pub trait VaultStore {
    /// Raw record at `address`, if any.
    fn read(&self, address: &Address) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the record at `address`.
    fn write(&mut self, address: Address, data: Vec<u8>) -> Result<(), StoreError>;

    /// `true` if a record exists at `address`.
    fn contains(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self.read(address)?.is_some())
    }

    /// Decode the record at `address`, if any.
    fn load(&self, address: &Address) -> Result<Option<Vault>, StoreError> {
        self.read(address)?
            .map(|bytes| Vault::decode(&bytes))
            .transpose()
    }
}

/// A [`VaultStore`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryVaultStore {
    accounts: HashMap<Address, Vec<u8>>,
}

impl MemoryVaultStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl VaultStore for MemoryVaultStore {
    fn read(&self, address: &Address) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.accounts.get(address).cloned())
    }

    fn write(&mut self, address: Address, data: Vec<u8>) -> Result<(), StoreError> {
        self.accounts.insert(address, data);
        Ok(())
    }
}
