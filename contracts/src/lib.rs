// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Coffer Vault Contracts
//!
//! The vault state machine: a single owned account holding one mint's
//! balance, with every balance or configuration change gated behind an
//! authorization policy.
//!
//! - **state**: the [`Vault`](state::Vault) record and its proposals.
//! - **authorization**: who may do what.
//! - **timelock** / **limiter**: the withdrawal guards.
//! - **delegates**: owner-appointed withdrawers.
//! - **multisig**: proposals, signatures, quorum.
//! - **ownership**: the two-phase handover.
//! - **instruction**: the serializable instruction set and outcomes.
//! - **store**: byte-level persistence of vault records.
//! - **ledger**: the orchestrator that runs instructions atomically.
//!
//! ## Design Principles
//!
//! 1. The vault is a record passed in and handed back. No globals, no
//!    wall clock; time and tokens are injected.
//! 2. All arithmetic is checked. Wrapping math and money do not mix.
//! 3. A failed instruction changes nothing. Not the record, not a balance.
//! 4. Proposals are never deleted. The record is its own audit trail.

pub mod authorization;
pub mod delegates;
pub mod error;
pub mod instruction;
pub mod ledger;
pub mod limiter;
pub mod multisig;
pub mod ownership;
pub mod state;
pub mod store;
pub mod timelock;

pub use authorization::ActionClass;
pub use error::VaultError;
pub use instruction::{Instruction, InstructionOutcome};
pub use ledger::VaultLedger;
pub use multisig::ApprovalOutcome;
pub use state::{PendingTransaction, ProposalStatus, TransactionKind, Vault};
pub use store::{MemoryVaultStore, StoreError, VaultStore};
