//! # Instructions
//!
//! The wire-level vocabulary of the vault. Every instruction except
//! `initialize` addresses an existing vault; the caller identity travels
//! alongside, as the execution substrate attests it.
//!
//! Instructions serialize with serde so a client can post them as JSON:
//!
//! ```
//! use coffer_contracts::instruction::Instruction;
//!
//! let ix: Instruction = serde_json::from_str(r#"{"withdraw":{"amount":500}}"#).unwrap();
//! assert_eq!(ix, Instruction::Withdraw { amount: 500 });
//! ```

use coffer_protocol::identity::Address;
use serde::{Deserialize, Serialize};

use crate::authorization::ActionClass;
use crate::multisig::ApprovalOutcome;

/// A vault instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Move `amount` from the owner's token account into the vault.
    Deposit { amount: u64 },
    /// Move `amount` out to the caller, or propose doing so under multisig.
    Withdraw { amount: u64 },
    /// Lock withdrawals for `duration_secs` from now.
    SetTimelock { duration_secs: u64 },
    /// Allow `delegate` to withdraw.
    AddDelegate { delegate: Address },
    /// Revoke `delegate`.
    RemoveDelegate { delegate: Address },
    /// Replace the co-signer set and threshold.
    SetMultisig { threshold: u8, signers: Vec<Address> },
    /// Sign proposal `id`, executing it on quorum.
    ApproveTransaction { id: u64 },
    /// Execute proposal `id`, which must already hold quorum.
    ExecuteTransaction { id: u64 },
    /// Replace the per-withdrawal ceiling.
    SetWithdrawalLimit { limit: u64 },
    /// Start handing the vault to `new_owner`.
    InitiateOwnershipTransfer { new_owner: Address },
    /// Complete a pending transfer as the incoming owner.
    AcceptOwnership,
    /// Abort a pending transfer.
    CancelOwnershipTransfer,
}

impl Instruction {
    /// Snake-case name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Deposit { .. } => "deposit",
            Instruction::Withdraw { .. } => "withdraw",
            Instruction::SetTimelock { .. } => "set_timelock",
            Instruction::AddDelegate { .. } => "add_delegate",
            Instruction::RemoveDelegate { .. } => "remove_delegate",
            Instruction::SetMultisig { .. } => "set_multisig",
            Instruction::ApproveTransaction { .. } => "approve_transaction",
            Instruction::ExecuteTransaction { .. } => "execute_transaction",
            Instruction::SetWithdrawalLimit { .. } => "set_withdrawal_limit",
            Instruction::InitiateOwnershipTransfer { .. } => "initiate_ownership_transfer",
            Instruction::AcceptOwnership => "accept_ownership",
            Instruction::CancelOwnershipTransfer => "cancel_ownership_transfer",
        }
    }

    /// The authorization class checked before anything else.
    pub fn action_class(&self) -> ActionClass {
        match self {
            Instruction::Withdraw { .. } => ActionClass::Withdraw,
            Instruction::ApproveTransaction { .. } | Instruction::ExecuteTransaction { .. } => {
                ActionClass::Approve
            }
            Instruction::AcceptOwnership => ActionClass::AcceptOwnership,
            Instruction::Deposit { .. }
            | Instruction::SetTimelock { .. }
            | Instruction::AddDelegate { .. }
            | Instruction::RemoveDelegate { .. }
            | Instruction::SetMultisig { .. }
            | Instruction::SetWithdrawalLimit { .. }
            | Instruction::InitiateOwnershipTransfer { .. }
            | Instruction::CancelOwnershipTransfer => ActionClass::Administer,
        }
    }
}

/// What a successful instruction did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionOutcome {
    /// Tokens moved into the vault.
    Deposited { amount: u64 },
    /// Tokens moved out to `destination`.
    Withdrawn { amount: u64, destination: Address },
    /// A withdrawal proposal was opened instead of paying out.
    ProposalCreated { id: u64 },
    /// Withdrawals are locked until `lock_until`.
    TimelockSet { lock_until: u64 },
    /// `inserted` is `false` when the delegate was already present.
    DelegateAdded { delegate: Address, inserted: bool },
    /// The delegate was revoked.
    DelegateRemoved { delegate: Address },
    /// New multisig rules; `cancelled` open proposals were dropped.
    MultisigConfigured {
        threshold: u8,
        signers: usize,
        cancelled: usize,
    },
    /// Result of an approval.
    Approval(ApprovalOutcome),
    /// An explicit execute succeeded.
    Executed { id: u64 },
    /// The ceiling changed from `previous` to `limit`.
    WithdrawalLimitSet { previous: u64, limit: u64 },
    /// A transfer is pending; `proposal` is set under multisig.
    OwnershipTransferInitiated {
        new_owner: Address,
        proposal: Option<u64>,
    },
    /// The vault changed hands.
    OwnershipAccepted {
        previous_owner: Address,
        new_owner: Address,
    },
    /// The pending transfer to `target` was aborted.
    OwnershipTransferCancelled { target: Address },
}
