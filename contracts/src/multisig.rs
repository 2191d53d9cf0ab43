//! # Multisig Coordinator
//!
//! With a threshold above one, withdrawals and ownership transfers stop
//! executing on the spot and become proposals:
//!
//! ```text
//! propose ──► sign ──► sign ──► … ──► quorum ──► executed
//!    │                                  │
//!    └──────────── cancelled ◄──────────┘ (blocked, awaiting retry)
//! ```
//!
//! Quorum is the number of recorded signatures, the proposer's included.
//! A proposal that reaches quorum while a guard blocks it stays open with
//! its signatures intact; it can be retried later with an explicit execute.
//! Proposals are never deleted.

use std::collections::BTreeSet;

use coffer_protocol::identity::Address;

use crate::error::VaultError;
use crate::state::{PendingTransaction, TransactionKind, Vault};

/// Result of an approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Signature recorded; more are needed.
    Pending {
        /// Signatures recorded so far.
        signatures: usize,
        /// Signatures required.
        threshold: u8,
    },
    /// Quorum reached and the proposal executed.
    Executed {
        /// The proposal.
        id: u64,
    },
    /// Quorum reached but a guard refused execution. The signature stands.
    Blocked {
        /// The proposal.
        id: u64,
        /// Why execution was refused.
        reason: VaultError,
    },
}

impl Vault {
    /// Replace the co-signer set and threshold.
    ///
    /// Open proposals were signed under the old rules, so they are all
    /// cancelled. Any pending ownership transfer is dropped too, with or
    /// without a proposal behind it. Returns how many were cancelled.
    ///
    /// # Errors
    ///
    /// - [`VaultError::TooManySigners`] above `max_signers`.
    /// - [`VaultError::InvalidSigners`] for repeats or the owner.
    /// - [`VaultError::InvalidThreshold`] outside `1..=signers + 1`.
    pub fn configure_multisig(
        &mut self,
        threshold: u8,
        signers: Vec<Address>,
        max_signers: usize,
    ) -> Result<usize, VaultError> {
        if signers.len() > max_signers {
            return Err(VaultError::TooManySigners {
                max: max_signers,
                got: signers.len(),
            });
        }
        let signer_set: BTreeSet<Address> = signers.iter().copied().collect();
        if signer_set.len() != signers.len() {
            return Err(VaultError::InvalidSigners("duplicate signer"));
        }
        if signer_set.contains(&self.owner) {
            return Err(VaultError::InvalidSigners("owner cannot be a co-signer"));
        }
        if threshold == 0 || usize::from(threshold) > signer_set.len() + 1 {
            return Err(VaultError::InvalidThreshold {
                threshold,
                signers: signer_set.len(),
            });
        }

        let cancelled = self.cancel_open_transactions(|_| true);
        // A pending transfer was authorized under the old policy.
        if let Some(target) = self.transfer_ownership_to.take() {
            tracing::warn!(
                vault = %self.address,
                target = %target,
                "multisig reconfigured; pending ownership transfer dropped"
            );
        }
        if cancelled > 0 {
            tracing::warn!(
                vault = %self.address,
                cancelled,
                "multisig reconfigured; open proposals cancelled"
            );
        }

        self.multisig_threshold = threshold;
        self.multisig_signers = signer_set;
        Ok(cancelled)
    }

    /// Open a proposal signed by `proposer`. Returns its id.
    ///
    /// # Errors
    ///
    /// - [`VaultError::TooManyPendingTransactions`] if `max_open` proposals
    ///   are already open.
    /// - [`VaultError::ArithmeticOverflow`] if the id counter is exhausted.
    pub fn open_proposal(
        &mut self,
        kind: TransactionKind,
        proposer: Address,
        now: u64,
        max_open: usize,
    ) -> Result<u64, VaultError> {
        if self.open_transactions().count() >= max_open {
            return Err(VaultError::TooManyPendingTransactions { max: max_open });
        }
        let id = self.next_transaction_id;
        self.next_transaction_id = id.checked_add(1).ok_or(VaultError::ArithmeticOverflow)?;
        self.pending_transactions
            .push(PendingTransaction::new(id, kind, proposer, now));
        Ok(id)
    }

    /// `true` if `tx` holds enough signatures under the current threshold.
    pub fn has_quorum(&self, tx: &PendingTransaction) -> bool {
        tx.signers.len() >= usize::from(self.multisig_threshold)
    }

    /// Record `signer`'s approval of proposal `id`. Returns the number of
    /// signatures afterwards.
    ///
    /// # Errors
    ///
    /// [`VaultError::TransactionNotFound`],
    /// [`VaultError::TransactionAlreadyExecuted`],
    /// [`VaultError::TransactionCancelled`], [`VaultError::AlreadySigned`],
    /// or [`VaultError::QuorumAlreadyReached`] when the proposal already
    /// has every signature it needs.
    pub fn sign_transaction(&mut self, id: u64, signer: Address) -> Result<usize, VaultError> {
        let threshold = usize::from(self.multisig_threshold);
        let tx = self
            .transaction_mut(id)
            .ok_or(VaultError::TransactionNotFound(id))?;
        if tx.executed {
            return Err(VaultError::TransactionAlreadyExecuted(id));
        }
        if tx.cancelled {
            return Err(VaultError::TransactionCancelled(id));
        }
        if tx.has_signed(&signer) {
            return Err(VaultError::AlreadySigned);
        }
        if tx.signers.len() >= threshold {
            return Err(VaultError::QuorumAlreadyReached(id));
        }
        tx.signers.push(signer);
        Ok(tx.signers.len())
    }

    /// The proposal `id`, provided it is open and holds quorum.
    pub fn executable_transaction(&self, id: u64) -> Result<&PendingTransaction, VaultError> {
        let tx = self
            .transaction(id)
            .ok_or(VaultError::TransactionNotFound(id))?;
        if tx.executed {
            return Err(VaultError::TransactionAlreadyExecuted(id));
        }
        if tx.cancelled {
            return Err(VaultError::TransactionCancelled(id));
        }
        if !self.has_quorum(tx) {
            return Err(VaultError::QuorumNotReached {
                signatures: tx.signers.len(),
                threshold: self.multisig_threshold,
            });
        }
        Ok(tx)
    }

    /// Flag proposal `id` executed. Returns `false` if it was not open.
    pub(crate) fn mark_executed(&mut self, id: u64) -> bool {
        match self.transaction_mut(id) {
            Some(tx) if tx.is_open() => {
                tx.executed = true;
                true
            }
            _ => false,
        }
    }

    /// Cancel every open proposal matching `filter`. Returns the count.
    pub(crate) fn cancel_open_transactions<F>(&mut self, filter: F) -> usize
    where
        F: Fn(&PendingTransaction) -> bool,
    {
        let mut cancelled = 0;
        for tx in self
            .pending_transactions
            .iter_mut()
            .filter(|tx| tx.is_open() && filter(&**tx))
        {
            tx.cancelled = true;
            cancelled += 1;
        }
        cancelled
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
