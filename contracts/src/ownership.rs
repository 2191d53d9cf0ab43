//! # Ownership Transfer
//!
//! Control changes hands in two phases so a typo cannot brick a vault:
//!
//! 1. The owner **initiates**, naming the incoming owner.
//! 2. The incoming owner **accepts**. Until then the owner may **cancel**.
//!
//! Under multisig the initiation also opens a `TransferOwnership` proposal.
//! Reaching quorum on it completes the transfer without a separate accept;
//! while it is still collecting signatures, accept is refused.
//!
//! Completing a transfer, by either path, clears the delegates and cancels
//! every other open proposal: both belonged to the previous owner.

use coffer_protocol::config::PendingTransferPolicy;
use coffer_protocol::identity::Address;

use crate::error::VaultError;
use crate::state::{TransactionKind, Vault};

impl Vault {
    /// Begin a transfer to `new_owner`, proposed by the current owner.
    ///
    /// Returns the id of the approval proposal when multisig is active.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidNewOwner`] if `new_owner` already owns the
    ///   vault.
    /// - [`VaultError::OwnershipTransferAlreadyPending`] when a transfer is
    ///   pending and `policy` is [`PendingTransferPolicy::Reject`].
    /// - [`VaultError::TooManyPendingTransactions`] if no proposal slot is
    ///   free.
    pub fn initiate_ownership_transfer(
        &mut self,
        new_owner: Address,
        now: u64,
        policy: PendingTransferPolicy,
        max_open: usize,
    ) -> Result<Option<u64>, VaultError> {
        if new_owner == self.owner {
            return Err(VaultError::InvalidNewOwner);
        }
        if let Some(current) = self.transfer_ownership_to {
            if policy == PendingTransferPolicy::Reject {
                return Err(VaultError::OwnershipTransferAlreadyPending(current));
            }
        }

        // Capacity is checked as if the superseded proposal were already
        // gone, before anything is touched.
        if self.requires_multisig() {
            let still_open = self
                .open_transactions()
                .filter(|tx| !tx.is_ownership_transfer())
                .count();
            if still_open >= max_open {
                return Err(VaultError::TooManyPendingTransactions { max: max_open });
            }
        }

        if let Some(previous) = self.transfer_ownership_to.take() {
            let superseded = self.cancel_open_transactions(|tx| tx.is_ownership_transfer());
            tracing::info!(
                vault = %self.address,
                previous = %previous,
                replacement = %new_owner,
                superseded,
                "pending ownership transfer replaced"
            );
        }

        let proposal = if self.requires_multisig() {
            let owner = self.owner;
            Some(self.open_proposal(
                TransactionKind::TransferOwnership { new_owner },
                owner,
                now,
                max_open,
            )?)
        } else {
            None
        };
        self.transfer_ownership_to = Some(new_owner);
        Ok(proposal)
    }

    /// Complete a pending transfer. The caller must already be authorized
    /// as the pending owner. Returns the previous owner.
    ///
    /// # Errors
    ///
    /// - [`VaultError::NoOwnershipTransferPending`] if nothing is pending.
    /// - [`VaultError::OwnershipTransferAwaitingApproval`] while the
    ///   multisig proposal for the transfer is still open.
    /// - [`VaultError::OwnershipTransferRequiresQuorum`] if multisig is
    ///   active. Only an executed proposal moves ownership then.
    pub fn accept_ownership(&mut self) -> Result<Address, VaultError> {
        let new_owner = self
            .transfer_ownership_to
            .ok_or(VaultError::NoOwnershipTransferPending)?;
        if let Some(tx) = self.open_ownership_proposal() {
            return Err(VaultError::OwnershipTransferAwaitingApproval(tx.id));
        }
        if self.requires_multisig() {
            return Err(VaultError::OwnershipTransferRequiresQuorum);
        }
        Ok(self.apply_ownership_change(new_owner))
    }

    /// Abort a pending transfer and cancel its proposal, if any. Returns
    /// the address that was going to receive the vault.
    pub fn cancel_ownership_transfer(&mut self) -> Result<Address, VaultError> {
        let target = self
            .transfer_ownership_to
            .take()
            .ok_or(VaultError::NoOwnershipTransferPending)?;
        self.cancel_open_transactions(|tx| tx.is_ownership_transfer());
        Ok(target)
    }

    /// Hand the vault to `new_owner`. Returns the previous owner.
    pub(crate) fn apply_ownership_change(&mut self, new_owner: Address) -> Address {
        let previous = std::mem::replace(&mut self.owner, new_owner);
        self.transfer_ownership_to = None;
        self.delegates.clear();
        self.cancel_open_transactions(|_| true);

        // The incoming owner cannot also be its own co-signer.
        if self.multisig_signers.remove(&new_owner) {
            let ceiling = self.multisig_signers.len() + 1;
            if usize::from(self.multisig_threshold) > ceiling {
                tracing::warn!(
                    vault = %self.address,
                    from = self.multisig_threshold,
                    to = ceiling,
                    "multisig threshold lowered after the new owner left the signer set"
                );
                self.multisig_threshold = u8::try_from(ceiling).unwrap_or(u8::MAX);
            }
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::new([1u8; 32]);
    const NEXT: Address = Address::new([2u8; 32]);
    const OTHER: Address = Address::new([3u8; 32]);
    const S1: Address = Address::new([4u8; 32]);

    fn vault() -> Vault {
        let mut v = Vault::new(
            Address::new([10u8; 32]),
            255,
            OWNER,
            Address::new([11u8; 32]),
            Address::new([12u8; 32]),
        );
        v.delegates.insert(Address::new([20u8; 32]));
        v
    }

    #[test]
    fn single_signer_handshake() {
        let mut v = vault();
        assert_eq!(
            v.initiate_ownership_transfer(NEXT, 0, PendingTransferPolicy::Replace, 10)
                .unwrap(),
            None
        );
        assert_eq!(v.transfer_ownership_to, Some(NEXT));
        assert_eq!(v.owner, OWNER);

        assert_eq!(v.accept_ownership().unwrap(), OWNER);
        assert_eq!(v.owner, NEXT);
        assert!(v.transfer_ownership_to.is_none());
        assert!(v.delegates.is_empty());
    }

    #[test]
    fn self_transfer_rejected() {
        let mut v = vault();
        assert_eq!(
            v.initiate_ownership_transfer(OWNER, 0, PendingTransferPolicy::Replace, 10),
            Err(VaultError::InvalidNewOwner)
        );
    }

    #[test]
    fn replace_policy_overwrites_target() {
        let mut v = vault();
        v.initiate_ownership_transfer(NEXT, 0, PendingTransferPolicy::Replace, 10)
            .unwrap();
        v.initiate_ownership_transfer(OTHER, 0, PendingTransferPolicy::Replace, 10)
            .unwrap();
        assert_eq!(v.transfer_ownership_to, Some(OTHER));
    }

    #[test]
    fn reject_policy_keeps_first_target() {
        let mut v = vault();
        v.initiate_ownership_transfer(NEXT, 0, PendingTransferPolicy::Reject, 10)
            .unwrap();
        assert_eq!(
            v.initiate_ownership_transfer(OTHER, 0, PendingTransferPolicy::Reject, 10),
            Err(VaultError::OwnershipTransferAlreadyPending(NEXT))
        );
        assert_eq!(v.transfer_ownership_to, Some(NEXT));
    }

    #[test]
    fn cancel_clears_target() {
        let mut v = vault();
        assert_eq!(
            v.cancel_ownership_transfer(),
            Err(VaultError::NoOwnershipTransferPending)
        );
        v.initiate_ownership_transfer(NEXT, 0, PendingTransferPolicy::Replace, 10)
            .unwrap();
        assert_eq!(v.cancel_ownership_transfer().unwrap(), NEXT);
        assert!(v.transfer_ownership_to.is_none());
        assert_eq!(v.accept_ownership(), Err(VaultError::NoOwnershipTransferPending));
    }

    #[test]
    fn multisig_transfer_opens_proposal_and_blocks_accept() {
        let mut v = vault();
        v.configure_multisig(2, vec![S1], 5).unwrap();
        let id = v
            .initiate_ownership_transfer(NEXT, 50, PendingTransferPolicy::Replace, 10)
            .unwrap()
            .unwrap();
        assert_eq!(v.transaction(id).unwrap().created_at, 50);
        assert_eq!(
            v.accept_ownership(),
            Err(VaultError::OwnershipTransferAwaitingApproval(id))
        );
        assert!(v.check_invariants().is_ok());
    }

    #[test]
    fn replacing_under_multisig_supersedes_the_proposal() {
        let mut v = vault();
        v.configure_multisig(2, vec![S1], 5).unwrap();
        let first = v
            .initiate_ownership_transfer(NEXT, 0, PendingTransferPolicy::Replace, 1)
            .unwrap()
            .unwrap();
        // Capacity of one still admits the replacement.
        let second = v
            .initiate_ownership_transfer(OTHER, 0, PendingTransferPolicy::Replace, 1)
            .unwrap()
            .unwrap();
        assert!(v.transaction(first).unwrap().cancelled);
        assert!(v.transaction(second).unwrap().is_open());
        assert!(v.check_invariants().is_ok());
    }

    #[test]
    fn cancel_under_multisig_cancels_proposal() {
        let mut v = vault();
        v.configure_multisig(2, vec![S1], 5).unwrap();
        let id = v
            .initiate_ownership_transfer(NEXT, 0, PendingTransferPolicy::Replace, 10)
            .unwrap()
            .unwrap();
        v.cancel_ownership_transfer().unwrap();
        assert!(v.transaction(id).unwrap().cancelled);
        assert_eq!(v.pending_transactions.len(), 1);
    }

    #[test]
    fn incoming_signer_leaves_signer_set() {
        let mut v = vault();
        v.configure_multisig(2, vec![S1], 5).unwrap();
        assert_eq!(v.apply_ownership_change(S1), OWNER);
        assert_eq!(v.owner, S1);
        assert!(v.multisig_signers.is_empty());
        assert_eq!(v.multisig_threshold, 1);
        assert!(v.check_invariants().is_ok());
    }

    #[test]
    fn accept_refused_while_multisig_active() {
        let mut v = vault();
        v.initiate_ownership_transfer(NEXT, 0, PendingTransferPolicy::Replace, 10)
            .unwrap();
        // Forced past the ledger: a proposal-less target under multisig.
        v.multisig_signers.insert(S1);
        v.multisig_threshold = 2;
        assert_eq!(
            v.accept_ownership(),
            Err(VaultError::OwnershipTransferRequiresQuorum)
        );
        assert_eq!(v.owner, OWNER);
    }
}
