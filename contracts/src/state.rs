//! # Vault Record
//!
//! The root aggregate. One [`Vault`] exists per owner, stored at the
//! address derived from `["vault", owner]`. Instruction handlers receive a
//! working copy, mutate it, and the ledger commits it only if the whole
//! instruction succeeded.
//!
//! Proposals live inside the record. They are appended, flagged executed or
//! cancelled, and never removed, so the record doubles as an audit trail.

use std::collections::BTreeSet;

use coffer_protocol::config::{UNLIMITED_WITHDRAWAL, VAULT_SCHEMA_VERSION};
use coffer_protocol::identity::Address;
use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::store::StoreError;

// ---------------------------------------------------------------------------
// Pending Transactions
// ---------------------------------------------------------------------------

/// What a proposal does once it executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Pay `amount` out of the vault into the `destination` token account.
    Withdraw {
        /// Amount in the mint's smallest unit.
        amount: u64,
        /// Token account credited on execution.
        destination: Address,
    },
    /// Hand administrative control to `new_owner`.
    TransferOwnership {
        /// The incoming owner.
        new_owner: Address,
    },
}

/// Lifecycle position of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Collecting signatures, or holding quorum but blocked by a guard.
    Open,
    /// Applied. Terminal.
    Executed,
    /// Superseded or withdrawn before execution. Terminal.
    Cancelled,
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStatus::Open => write!(f, "Open"),
            ProposalStatus::Executed => write!(f, "Executed"),
            ProposalStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A multisig proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Unique within the vault, assigned in creation order.
    pub id: u64,
    /// The effect applied at execution.
    pub kind: TransactionKind,
    /// Approvers in signing order; the proposer comes first.
    pub signers: Vec<Address>,
    /// Set once, when the effect is applied.
    pub executed: bool,
    /// Set once, when the proposal is withdrawn or superseded.
    pub cancelled: bool,
    /// Unix time of creation.
    pub created_at: u64,
}

impl PendingTransaction {
    /// A fresh proposal carrying only the proposer's signature.
    pub fn new(id: u64, kind: TransactionKind, proposer: Address, created_at: u64) -> Self {
        Self {
            id,
            kind,
            signers: vec![proposer],
            executed: false,
            cancelled: false,
            created_at,
        }
    }

    /// Current lifecycle position.
    pub fn status(&self) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if self.cancelled {
            ProposalStatus::Cancelled
        } else {
            ProposalStatus::Open
        }
    }

    /// `true` while neither executed nor cancelled.
    pub fn is_open(&self) -> bool {
        self.status() == ProposalStatus::Open
    }

    /// `true` if `who` already approved.
    pub fn has_signed(&self, who: &Address) -> bool {
        self.signers.contains(who)
    }

    /// `true` if this proposal would transfer ownership.
    pub fn is_ownership_transfer(&self) -> bool {
        matches!(self.kind, TransactionKind::TransferOwnership { .. })
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// A custodial vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Derived address of this record. Fixed for life.
    pub address: Address,
    /// Bump seed that produced `address`.
    pub bump: u8,
    /// Sole administrator.
    pub owner: Address,
    /// Mint whose units the vault holds.
    pub mint: Address,
    /// Vault-controlled token account.
    pub token_account: Address,
    /// Withdrawals fail while `now < lock_until`. Zero means unlocked.
    pub lock_until: u64,
    /// Addresses allowed to withdraw but not administer.
    pub delegates: BTreeSet<Address>,
    /// Signatures (owner included) needed to execute a proposal.
    pub multisig_threshold: u8,
    /// Co-signers besides the owner.
    pub multisig_signers: BTreeSet<Address>,
    /// Every proposal ever opened, in id order.
    pub pending_transactions: Vec<PendingTransaction>,
    /// Id handed to the next proposal.
    pub next_transaction_id: u64,
    /// Ceiling on a single withdrawal.
    pub max_withdrawal_limit: u64,
    /// Incoming owner while a transfer is pending.
    pub transfer_ownership_to: Option<Address>,
}

impl Vault {
    /// A fresh vault: unlocked, no delegates, single-signature, unlimited.
    pub fn new(
        address: Address,
        bump: u8,
        owner: Address,
        mint: Address,
        token_account: Address,
    ) -> Self {
        Self {
            address,
            bump,
            owner,
            mint,
            token_account,
            lock_until: 0,
            delegates: BTreeSet::new(),
            multisig_threshold: 1,
            multisig_signers: BTreeSet::new(),
            pending_transactions: Vec::new(),
            next_transaction_id: 0,
            max_withdrawal_limit: UNLIMITED_WITHDRAWAL,
            transfer_ownership_to: None,
        }
    }

    /// `true` if `who` owns the vault.
    pub fn is_owner(&self, who: &Address) -> bool {
        self.owner == *who
    }

    /// `true` if `who` is a delegate.
    pub fn is_delegate(&self, who: &Address) -> bool {
        self.delegates.contains(who)
    }

    /// `true` if `who` is a co-signer (the owner is not counted).
    pub fn is_multisig_signer(&self, who: &Address) -> bool {
        self.multisig_signers.contains(who)
    }

    /// `true` when withdrawals and ownership transfers go through proposals.
    pub fn requires_multisig(&self) -> bool {
        self.multisig_threshold > 1
    }

    /// Look up a proposal by id.
    pub fn transaction(&self, id: u64) -> Option<&PendingTransaction> {
        self.pending_transactions.iter().find(|tx| tx.id == id)
    }

    pub(crate) fn transaction_mut(&mut self, id: u64) -> Option<&mut PendingTransaction> {
        self.pending_transactions.iter_mut().find(|tx| tx.id == id)
    }

    /// Proposals that are neither executed nor cancelled.
    pub fn open_transactions(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.pending_transactions.iter().filter(|tx| tx.is_open())
    }

    /// The open ownership-transfer proposal, if any.
    pub fn open_ownership_proposal(&self) -> Option<&PendingTransaction> {
        self.open_transactions()
            .find(|tx| tx.is_ownership_transfer())
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    /// Binary account form: a schema version byte followed by bincode.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        let body = bincode::serialize(self).map_err(|e| StoreError::Encode(e.to_string()))?;
        let mut bytes = Vec::with_capacity(body.len() + 1);
        bytes.push(VAULT_SCHEMA_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Inverse of [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let (&version, body) = bytes.split_first().ok_or(StoreError::Empty)?;
        if version != VAULT_SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                expected: VAULT_SCHEMA_VERSION,
                got: version,
            });
        }
        bincode::deserialize(body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Pretty JSON for presentation clients. Addresses render as Base58.
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Encode(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Verify the structural invariants of the record.
    ///
    /// The ledger calls this before every commit; a failure aborts the
    /// instruction instead of persisting a corrupt vault.
    pub fn check_invariants(&self) -> Result<(), VaultError> {
        let threshold = usize::from(self.multisig_threshold);
        if threshold == 0 || threshold > self.multisig_signers.len() + 1 {
            return Err(VaultError::InvariantViolation(
                "multisig threshold out of range",
            ));
        }
        if self.multisig_signers.contains(&self.owner) {
            return Err(VaultError::InvariantViolation(
                "owner listed as multisig signer",
            ));
        }
        if self.transfer_ownership_to == Some(self.owner) {
            return Err(VaultError::InvariantViolation(
                "pending owner equals current owner",
            ));
        }

        let mut previous_id: Option<u64> = None;
        let mut open_ownership = 0usize;
        for tx in &self.pending_transactions {
            if previous_id.map_or(false, |prev| tx.id <= prev) || tx.id >= self.next_transaction_id
            {
                return Err(VaultError::InvariantViolation("proposal ids out of order"));
            }
            previous_id = Some(tx.id);

            if tx.executed && tx.cancelled {
                return Err(VaultError::InvariantViolation(
                    "proposal both executed and cancelled",
                ));
            }
            let distinct: BTreeSet<&Address> = tx.signers.iter().collect();
            if distinct.len() != tx.signers.len() {
                return Err(VaultError::InvariantViolation("duplicate proposal signer"));
            }
            if tx.is_open() && tx.signers.len() > threshold {
                return Err(VaultError::InvariantViolation(
                    "open proposal has more signatures than the threshold",
                ));
            }
            if let (true, TransactionKind::TransferOwnership { new_owner }) = (tx.is_open(), tx.kind)
            {
                open_ownership += 1;
                if self.transfer_ownership_to != Some(new_owner) {
                    return Err(VaultError::InvariantViolation(
                        "open ownership proposal disagrees with pending owner",
                    ));
                }
            }
        }
        if open_ownership > 1 {
            return Err(VaultError::InvariantViolation(
                "more than one open ownership proposal",
            ));
        }
        if self.requires_multisig() && self.transfer_ownership_to.is_some() && open_ownership == 0
        {
            return Err(VaultError::InvariantViolation(
                "pending owner without an ownership proposal under multisig",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
