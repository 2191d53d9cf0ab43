//! # Authorization Policy
//!
//! Who may do what, decided from the vault record and the caller alone.
//! Checks never mutate the vault.
//!
//! | Action            | Allowed callers                                   |
//! |-------------------|---------------------------------------------------|
//! | `Administer`      | owner                                             |
//! | `Withdraw`        | owner, delegate, co-signer when threshold > 1     |
//! | `Approve`         | owner, co-signer                                  |
//! | `AcceptOwnership` | the pending owner                                 |

use coffer_protocol::identity::Address;
use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::state::Vault;

/// Classes of privileged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionClass {
    /// Configuration changes and deposits.
    Administer,
    /// Moving funds out, directly or by proposal.
    Withdraw,
    /// Signing or executing proposals.
    Approve,
    /// Completing a two-phase ownership transfer.
    AcceptOwnership,
}

impl Vault {
    /// Decide whether `caller` may perform `action`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::NotVaultOwner`] for `Administer` by a non-owner.
    /// - [`VaultError::NotAuthorized`] for `Withdraw` / `Approve` by an
    ///   ineligible caller.
    /// - [`VaultError::NoOwnershipTransferPending`] /
    ///   [`VaultError::NotPendingOwner`] for `AcceptOwnership`.
    pub fn authorize(&self, caller: &Address, action: ActionClass) -> Result<(), VaultError> {
        match action {
            ActionClass::Administer => self
                .is_owner(caller)
                .then_some(())
                .ok_or(VaultError::NotVaultOwner),
            ActionClass::Withdraw => (self.is_owner(caller)
                || self.is_delegate(caller)
                || (self.requires_multisig() && self.is_multisig_signer(caller)))
            .then_some(())
            .ok_or(VaultError::NotAuthorized),
            ActionClass::Approve => (self.is_owner(caller) || self.is_multisig_signer(caller))
                .then_some(())
                .ok_or(VaultError::NotAuthorized),
            ActionClass::AcceptOwnership => match self.transfer_ownership_to {
                None => Err(VaultError::NoOwnershipTransferPending),
                Some(pending) if pending == *caller => Ok(()),
                Some(_) => Err(VaultError::NotPendingOwner),
            },
        }
    }
}
