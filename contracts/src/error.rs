//! Every way a vault instruction can fail.
//!
//! A returned error always means the instruction had no effect: no field of
//! the vault record changed and no tokens moved.

use coffer_protocol::identity::{Address, AddressError};
use coffer_protocol::token::TokenError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by vault instructions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    // ---- Authorization ----
    /// The caller is not the vault owner.
    #[error("caller is not the vault owner")]
    NotVaultOwner,

    /// The caller is neither owner, delegate nor eligible signer.
    #[error("caller is not authorized for this action")]
    NotAuthorized,

    /// The caller is not the pending new owner.
    #[error("caller is not the pending owner")]
    NotPendingOwner,

    // ---- Guards ----
    /// Withdrawals are timelocked.
    #[error("vault is locked until {until} (now {now})")]
    VaultLocked {
        /// Unix time the lock lifts.
        until: u64,
        /// Unix time of the attempt.
        now: u64,
    },

    /// The vault (or depositor) balance is short.
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance of the source token account.
        available: u64,
        /// Amount requested.
        requested: u64,
    },

    /// The amount exceeds the per-withdrawal ceiling.
    #[error("withdrawal of {requested} exceeds limit {limit}")]
    WithdrawalLimitExceeded {
        /// Configured ceiling.
        limit: u64,
        /// Amount requested.
        requested: u64,
    },

    /// Zero-amount deposits and withdrawals are refused.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// A timelock duration above the configured maximum.
    #[error("timelock of {requested}s exceeds maximum {max}s")]
    TimelockTooLong {
        /// Requested duration in seconds.
        requested: u64,
        /// Configured maximum in seconds.
        max: u64,
    },

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    // ---- Delegates ----
    /// The delegate set is full.
    #[error("maximum of {max} delegates reached")]
    MaxDelegatesReached {
        /// Configured capacity.
        max: usize,
    },

    /// Removing a delegate that is not in the set.
    #[error("delegate {0} not found")]
    DelegateNotFound(Address),

    // ---- Multisig ----
    /// Threshold outside `1..=signers + 1`.
    #[error("invalid threshold {threshold} for {signers} signers plus owner")]
    InvalidThreshold {
        /// Requested threshold.
        threshold: u8,
        /// Number of signers besides the owner.
        signers: usize,
    },

    /// More signers than the configured capacity.
    #[error("too many signers: {got} (max {max})")]
    TooManySigners {
        /// Configured capacity.
        max: usize,
        /// Number supplied.
        got: usize,
    },

    /// The signer list repeats an address or names the owner.
    #[error("invalid signer set: {0}")]
    InvalidSigners(&'static str),

    /// Opening another proposal would exceed the open-proposal capacity.
    #[error("too many pending transactions (max {max})")]
    TooManyPendingTransactions {
        /// Configured capacity.
        max: usize,
    },

    /// No proposal with this id.
    #[error("transaction {0} not found")]
    TransactionNotFound(u64),

    /// The caller already signed this proposal.
    #[error("caller already signed this transaction")]
    AlreadySigned,

    /// The proposal has already been executed.
    #[error("transaction {0} already executed")]
    TransactionAlreadyExecuted(u64),

    /// The proposal was cancelled.
    #[error("transaction {0} was cancelled")]
    TransactionCancelled(u64),

    /// The proposal holds quorum and awaits execution; more signatures
    /// would not change anything.
    #[error("transaction {0} already holds quorum")]
    QuorumAlreadyReached(u64),

    /// Explicit execution of a proposal short of quorum.
    #[error("quorum not reached: {signatures} of {threshold} signatures")]
    QuorumNotReached {
        /// Signatures recorded.
        signatures: usize,
        /// Signatures required.
        threshold: u8,
    },

    // ---- Ownership ----
    /// No ownership transfer is pending.
    #[error("no ownership transfer pending")]
    NoOwnershipTransferPending,

    /// A transfer is already pending and the policy forbids replacing it.
    #[error("ownership transfer to {0} already pending")]
    OwnershipTransferAlreadyPending(Address),

    /// The pending transfer still needs multisig approval.
    #[error("ownership transfer awaits multisig approval (transaction {0})")]
    OwnershipTransferAwaitingApproval(u64),

    /// Multisig is active and no approved proposal backs the transfer.
    #[error("ownership transfer requires multisig quorum")]
    OwnershipTransferRequiresQuorum,

    /// Transferring ownership to the current owner.
    #[error("new owner must differ from the current owner")]
    InvalidNewOwner,

    // ---- Accounts ----
    /// A vault already exists for this owner.
    #[error("vault {0} already exists")]
    VaultAlreadyExists(Address),

    /// No vault record at this address.
    #[error("vault {0} not found")]
    VaultNotFound(Address),

    /// A required token account does not exist.
    #[error("token account {0} not found")]
    TokenAccountNotFound(Address),

    /// A token account exists but belongs to another owner or mint.
    #[error("token account {0} does not match the vault owner or mint")]
    TokenAccountMismatch(Address),

    /// The vault record failed its own consistency check.
    #[error("vault invariant violated: {0}")]
    InvariantViolation(&'static str),

    // ---- Collaborators ----
    /// Address derivation failed.
    #[error("address derivation failed: {0}")]
    Derivation(#[from] AddressError),

    /// The token ledger refused the movement.
    #[error("token ledger error: {0}")]
    Token(TokenError),

    /// The account store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl VaultError {
    /// `true` for failures that a proposal at quorum can outlive: time,
    /// limit or balance may change, after which an explicit execute can
    /// succeed.
    pub fn is_deferrable(&self) -> bool {
        matches!(
            self,
            VaultError::VaultLocked { .. }
                | VaultError::WithdrawalLimitExceeded { .. }
                | VaultError::InsufficientFunds { .. }
        )
    }
}

impl From<TokenError> for VaultError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientFunds {
                available,
                requested,
            } => VaultError::InsufficientFunds {
                available,
                requested,
            },
            TokenError::AccountNotFound(account) => VaultError::TokenAccountNotFound(account),
            TokenError::OwnerMismatch { account, .. } => VaultError::TokenAccountMismatch(account),
            other => VaultError::Token(other),
        }
    }
}
