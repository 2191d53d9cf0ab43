//! # Protocol Configuration & Constants
//!
//! Every magic number in Coffer lives here, next to the runtime
//! [`VaultConfig`] that lets an operator tighten or loosen the defaults.
//!
//! Capacities mirror the fixed account layout the vault program was first
//! deployed with: ten delegates, five extra multisig signers and ten open
//! proposals. Raising them is safe for the engine; the limits exist so a
//! single vault record stays small enough to load and persist in one go.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::crypto::hash::sha256;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Crate-level protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Version byte prefixed to every encoded vault record. Bump on any
/// layout change so old records are rejected instead of misread.
pub const VAULT_SCHEMA_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Derivation Seeds
// ---------------------------------------------------------------------------

/// Seed prefix for vault record addresses.
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed prefix for associated token account addresses.
pub const TOKEN_ACCOUNT_SEED: &[u8] = b"token";

/// Label hashed into the default program id.
const DEFAULT_PROGRAM_LABEL: &[u8] = b"coffer:vault-program:v1";

// ---------------------------------------------------------------------------
// Capacities
// ---------------------------------------------------------------------------

/// Default maximum number of delegates per vault.
pub const DEFAULT_MAX_DELEGATES: usize = 10;

/// Default maximum number of multisig signers (owner not included).
pub const DEFAULT_MAX_MULTISIG_SIGNERS: usize = 5;

/// Default maximum number of proposals awaiting signatures at once.
pub const DEFAULT_MAX_OPEN_PROPOSALS: usize = 10;

/// Withdrawal ceiling of a fresh vault: effectively unlimited.
pub const UNLIMITED_WITHDRAWAL: u64 = u64::MAX;

/// The threshold is stored as a `u8`, so the signer set (plus the owner)
/// can never exceed this.
pub const MAX_REPRESENTABLE_SIGNERS: usize = u8::MAX as usize - 1;

/// The program id used when none is configured.
pub fn default_program_id() -> Address {
    Address::new(sha256(DEFAULT_PROGRAM_LABEL))
}

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(String),

    /// The configuration document is not valid JSON for [`VaultConfig`].
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A value is out of its permitted range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// What happens when an owner initiates an ownership transfer while another
/// one is still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingTransferPolicy {
    /// The new target silently supersedes the pending one.
    #[default]
    Replace,
    /// The call fails until the pending transfer is accepted or cancelled.
    Reject,
}

/// Tunable limits and policies for the vault engine.
///
/// Every field has a default, so a config document only needs to mention
/// what it changes:
///
/// ```
/// use coffer_protocol::config::{PendingTransferPolicy, VaultConfig};
///
/// let cfg = VaultConfig::from_json(r#"{ "pending_transfer_policy": "reject" }"#).unwrap();
/// assert_eq!(cfg.pending_transfer_policy, PendingTransferPolicy::Reject);
/// assert_eq!(cfg.max_delegates, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Program id that scopes every derived address.
    pub program_id: Address,
    /// Maximum delegates per vault.
    pub max_delegates: usize,
    /// Maximum multisig signers per vault, owner excluded.
    pub max_multisig_signers: usize,
    /// Maximum proposals that may await signatures simultaneously.
    pub max_open_proposals: usize,
    /// Upper bound on a single `set_timelock` duration. `None` = unbounded.
    pub max_timelock_secs: Option<u64>,
    /// Behaviour of `initiate_ownership_transfer` while one is pending.
    pub pending_transfer_policy: PendingTransferPolicy,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            max_delegates: DEFAULT_MAX_DELEGATES,
            max_multisig_signers: DEFAULT_MAX_MULTISIG_SIGNERS,
            max_open_proposals: DEFAULT_MAX_OPEN_PROPOSALS,
            max_timelock_secs: None,
            pending_transfer_policy: PendingTransferPolicy::default(),
        }
    }
}

impl VaultConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), "vault config loaded");
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_delegates == 0 {
            return Err(ConfigError::Invalid {
                field: "max_delegates",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_multisig_signers == 0 || self.max_multisig_signers > MAX_REPRESENTABLE_SIGNERS
        {
            return Err(ConfigError::Invalid {
                field: "max_multisig_signers",
                reason: format!("must be between 1 and {}", MAX_REPRESENTABLE_SIGNERS),
            });
        }
        if self.max_open_proposals == 0 {
            return Err(ConfigError::Invalid {
                field: "max_open_proposals",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_timelock_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_timelock_secs",
                reason: "use null for no bound; zero would forbid every timelock".into(),
            });
        }
        Ok(())
    }
}
