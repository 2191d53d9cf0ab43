//! # Timelock Guard
//!
//! A vault can be frozen for withdrawals until a point in time. The lock
//! gates every withdrawal, direct or proposal-triggered, and nothing else:
//! deposits and configuration changes still go through.

use crate::error::VaultError;
use crate::state::Vault;

impl Vault {
    /// `true` while `now < lock_until`.
    pub fn is_locked(&self, now: u64) -> bool {
        now < self.lock_until
    }

    /// Fails with [`VaultError::VaultLocked`] while the lock holds.
    pub fn check_timelock(&self, now: u64) -> Result<(), VaultError> {
        if self.is_locked(now) {
            tracing::debug!(vault = %self.address, until = self.lock_until, now, "timelock holds");
            return Err(VaultError::VaultLocked {
                until: self.lock_until,
                now,
            });
        }
        Ok(())
    }

    /// Lock withdrawals for `duration` seconds from `now`. Returns the new
    /// `lock_until`.
    ///
    /// Later calls overwrite earlier ones, so a lock can be shortened as
    /// well as extended. A zero duration unlocks immediately.
    ///
    /// # Errors
    ///
    /// - [`VaultError::TimelockTooLong`] if `duration` exceeds `max`.
    /// - [`VaultError::ArithmeticOverflow`] if `now + duration` overflows.
    pub fn set_timelock(
        &mut self,
        duration: u64,
        now: u64,
        max: Option<u64>,
    ) -> Result<u64, VaultError> {
        if let Some(max) = max {
            if duration > max {
                return Err(VaultError::TimelockTooLong {
                    requested: duration,
                    max,
                });
            }
        }
        let until = now
            .checked_add(duration)
            .ok_or(VaultError::ArithmeticOverflow)?;
        self.lock_until = until;
        Ok(until)
    }
}
