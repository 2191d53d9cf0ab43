//! # Delegate Registry
//!
//! Delegates may withdraw on the owner's behalf but may not administer.
//! The set is bounded and belongs to the current owner: an ownership change
//! clears it.

use coffer_protocol::identity::Address;

use crate::error::VaultError;
use crate::state::Vault;

impl Vault {
    /// Add `delegate`. Returns `false` if it was already present, in which
    /// case nothing changes.
    ///
    /// # Errors
    ///
    /// [`VaultError::MaxDelegatesReached`] if the set already holds `max`
    /// entries.
    pub fn add_delegate(&mut self, delegate: Address, max: usize) -> Result<bool, VaultError> {
        if self.delegates.contains(&delegate) {
            return Ok(false);
        }
        if self.delegates.len() >= max {
            return Err(VaultError::MaxDelegatesReached { max });
        }
        Ok(self.delegates.insert(delegate))
    }

    /// Remove `delegate`.
    ///
    /// # Errors
    ///
    /// [`VaultError::DelegateNotFound`] if it is not in the set.
    pub fn remove_delegate(&mut self, delegate: &Address) -> Result<(), VaultError> {
        if !self.delegates.remove(delegate) {
            return Err(VaultError::DelegateNotFound(*delegate));
        }
        Ok(())
    }
}
