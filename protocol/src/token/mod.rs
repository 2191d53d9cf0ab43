//! # Token Movement
//!
//! The vault engine never owns fungible units itself. It asks a
//! [`TokenLedger`] to move them between token accounts, naming the
//! authority that signs for the source account. The ledger is the one that
//! refuses to overdraw, to move tokens on someone else's authority, or to
//! mix mints.
//!
//! [`MemoryTokenLedger`] is the in-process implementation used by tests and
//! local tooling.

pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Address;

pub use memory::MemoryTokenLedger;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a [`TokenLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The source account holds less than the amount requested.
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Current balance of the source account.
        available: u64,
        /// Amount the caller tried to move.
        requested: u64,
    },

    /// No token account exists at this address.
    #[error("token account {0} not found")]
    AccountNotFound(Address),

    /// A token account already exists at this address.
    #[error("token account {0} already exists")]
    AccountExists(Address),

    /// The signing authority does not own the source account.
    #[error("authority {authority} does not own token account {account}")]
    OwnerMismatch {
        /// The source account.
        account: Address,
        /// The authority that was presented.
        authority: Address,
    },

    /// The two accounts hold different mints.
    #[error("mint mismatch: {expected} vs {got}")]
    MintMismatch {
        /// Mint of the source account.
        expected: Address,
        /// Mint of the destination account.
        got: Address,
    },

    /// Crediting the destination would overflow `u64`.
    #[error("token balance overflow on {0}")]
    Overflow(Address),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A balance of one mint, controlled by one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    /// The address allowed to move funds out of this account.
    pub owner: Address,
    /// The mint whose units this account holds.
    pub mint: Address,
    /// Balance in the mint's smallest unit.
    pub amount: u64,
}

impl TokenAccount {
    /// An empty account.
    pub fn new(owner: Address, mint: Address) -> Self {
        Self {
            owner,
            mint,
            amount: 0,
        }
    }
}

/// Moves fungible units between token accounts.
///
/// Implementations must make [`transfer`](TokenLedger::transfer) atomic:
/// either both balances change or neither does.
pub trait TokenLedger {
    /// Create an empty account at `account`, owned by `owner`, for `mint`.
    fn open_account(
        &mut self,
        account: Address,
        owner: Address,
        mint: Address,
    ) -> Result<(), TokenError>;

    /// Snapshot of the account at `account`, if any.
    fn account(&self, account: &Address) -> Option<TokenAccount>;

    /// Balance of `account`.
    fn balance(&self, account: &Address) -> Result<u64, TokenError> {
        self.account(account)
            .map(|a| a.amount)
            .ok_or(TokenError::AccountNotFound(*account))
    }

    /// Move `amount` from `from` to `to`, signed by `authority`.
    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        authority: &Address,
        amount: u64,
    ) -> Result<(), TokenError>;
}
