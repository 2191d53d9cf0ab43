//! In-memory [`TokenLedger`].

use std::collections::HashMap;

use super::{TokenAccount, TokenError, TokenLedger};
use crate::identity::Address;

/// A token ledger backed by a `HashMap`.
///
/// Besides the [`TokenLedger`] contract it can mint out of thin air, which
/// is exactly what fixtures need and exactly why nothing else should use it.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenLedger {
    accounts: HashMap<Address, TokenAccount>,
}

impl MemoryTokenLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` new units to `account`.
    ///
    /// # Errors
    ///
    /// [`TokenError::AccountNotFound`] if the account does not exist,
    /// [`TokenError::Overflow`] if the balance would exceed `u64::MAX`.
    pub fn mint_to(&mut self, account: &Address, amount: u64) -> Result<u64, TokenError> {
        let entry = self
            .accounts
            .get_mut(account)
            .ok_or(TokenError::AccountNotFound(*account))?;
        entry.amount = entry
            .amount
            .checked_add(amount)
            .ok_or(TokenError::Overflow(*account))?;
        tracing::debug!(account = %account, amount, "minted");
        Ok(entry.amount)
    }

    /// Sum of every balance. Transfers never change it.
    pub fn total_supply(&self) -> u128 {
        self.accounts.values().map(|a| u128::from(a.amount)).sum()
    }

    /// Number of open accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// `true` if no account has been opened.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl TokenLedger for MemoryTokenLedger {
    fn open_account(
        &mut self,
        account: Address,
        owner: Address,
        mint: Address,
    ) -> Result<(), TokenError> {
        if self.accounts.contains_key(&account) {
            return Err(TokenError::AccountExists(account));
        }
        self.accounts.insert(account, TokenAccount::new(owner, mint));
        tracing::debug!(account = %account, owner = %owner, mint = %mint, "token account opened");
        Ok(())
    }

    fn account(&self, account: &Address) -> Option<TokenAccount> {
        self.accounts.get(account).cloned()
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        authority: &Address,
        amount: u64,
    ) -> Result<(), TokenError> {
        let source = self
            .accounts
            .get(from)
            .ok_or(TokenError::AccountNotFound(*from))?;
        let dest = self
            .accounts
            .get(to)
            .ok_or(TokenError::AccountNotFound(*to))?;

        if source.owner != *authority {
            return Err(TokenError::OwnerMismatch {
                account: *from,
                authority: *authority,
            });
        }
        if source.mint != dest.mint {
            return Err(TokenError::MintMismatch {
                expected: source.mint,
                got: dest.mint,
            });
        }
        if source.amount < amount {
            return Err(TokenError::InsufficientFunds {
                available: source.amount,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        // Compute both sides before touching either.
        let debited = source.amount - amount;
        let credited = dest
            .amount
            .checked_add(amount)
            .ok_or(TokenError::Overflow(*to))?;

        if let Some(src) = self.accounts.get_mut(from) {
            src.amount = debited;
        }
        if let Some(dst) = self.accounts.get_mut(to) {
            dst.amount = credited;
        }

        tracing::debug!(from = %from, to = %to, amount, "tokens transferred");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
