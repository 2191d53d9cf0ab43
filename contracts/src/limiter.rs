//! Per-withdrawal ceiling.

use crate::error::VaultError;
use crate::state::Vault;

impl Vault {
    /// Fails with [`VaultError::WithdrawalLimitExceeded`] if `amount` is
    /// above the ceiling. Checked when a proposal is opened and again when
    /// it executes.
    pub fn check_withdrawal_limit(&self, amount: u64) -> Result<(), VaultError> {
        if amount > self.max_withdrawal_limit {
            tracing::debug!(
                vault = %self.address,
                limit = self.max_withdrawal_limit,
                amount,
                "withdrawal limit exceeded"
            );
            return Err(VaultError::WithdrawalLimitExceeded {
                limit: self.max_withdrawal_limit,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Replace the ceiling. Returns the previous value.
    pub fn set_withdrawal_limit(&mut self, limit: u64) -> u64 {
        std::mem::replace(&mut self.max_withdrawal_limit, limit)
    }
}
