//! # Vault Ledger
//!
//! The orchestrator. Every instruction enters here and runs the same way:
//!
//! 1. Load a working copy of the vault record.
//! 2. Authorize the caller for the instruction's action class.
//! 3. Run the handler against the copy. Guards run in a fixed order:
//!    timelock, then withdrawal limit, then balance.
//! 4. Check the record's invariants and encode it.
//! 5. Move tokens, if the instruction moves any. This is the last step
//!    that can fail.
//! 6. Write the record back.
//!
//! Any failure before step 6 drops the working copy, so a rejected
//! instruction leaves neither the record nor any balance changed.

use coffer_protocol::clock::Clock;
use coffer_protocol::config::{ConfigError, VaultConfig};
use coffer_protocol::identity::{associated_token_address, vault_address, Address};
use coffer_protocol::token::TokenLedger;

use crate::error::VaultError;
use crate::instruction::{Instruction, InstructionOutcome};
use crate::multisig::ApprovalOutcome;
use crate::state::{TransactionKind, Vault};
use crate::store::VaultStore;

/// A token movement the ledger performs once the record is ready to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TokenMovement {
    from: Address,
    to: Address,
    authority: Address,
    amount: u64,
}

/// What a handler hands back to the commit path.
#[derive(Debug)]
struct Step {
    outcome: InstructionOutcome,
    movement: Option<TokenMovement>,
}

impl Step {
    fn record_only(outcome: InstructionOutcome) -> Self {
        Self {
            outcome,
            movement: None,
        }
    }
}

/// Runs vault instructions against a store, a token ledger and a clock.
#[derive(Debug)]
pub struct VaultLedger<S, T, C> {
    config: VaultConfig,
    store: S,
    tokens: T,
    clock: C,
}

impl<S: VaultStore, T: TokenLedger, C: Clock> VaultLedger<S, T, C> {
    /// Build a ledger. The configuration is validated first.
    pub fn new(config: VaultConfig, store: S, tokens: T, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            tokens,
            clock,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Active configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The account store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The token ledger.
    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    /// Mutable token ledger, for funding and inspecting accounts from
    /// outside the vault.
    pub fn tokens_mut(&mut self) -> &mut T {
        &mut self.tokens
    }

    /// The clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // -----------------------------------------------------------------------
    // Addresses
    // -----------------------------------------------------------------------

    /// The vault address `owner` gets at initialization.
    ///
    /// The address is fixed when the vault is created. After an ownership
    /// transfer the record stays where the original owner's seeds put it,
    /// so this no longer locates a vault the caller received; keep the
    /// address from [`initialize`](Self::initialize) instead. A new owner
    /// may still initialize a vault of their own at this address.
    pub fn vault_address(&self, owner: &Address) -> Result<Address, VaultError> {
        Ok(vault_address(owner, &self.config.program_id)?.0)
    }

    /// The token account `holder` uses for `mint`.
    pub fn token_account_address(
        &self,
        holder: &Address,
        mint: &Address,
    ) -> Result<Address, VaultError> {
        Ok(associated_token_address(
            holder,
            mint,
            &self.config.program_id,
        )?)
    }

    /// Open `holder`'s associated token account for `mint`.
    pub fn open_token_account(
        &mut self,
        holder: &Address,
        mint: &Address,
    ) -> Result<Address, VaultError> {
        let account = self.token_account_address(holder, mint)?;
        self.tokens.open_account(account, *holder, *mint)?;
        Ok(account)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Load the vault at `address`.
    pub fn vault(&self, address: &Address) -> Result<Vault, VaultError> {
        self.store
            .load(address)?
            .ok_or(VaultError::VaultNotFound(*address))
    }

    /// Balance held by the vault at `address`.
    pub fn query_balance(&self, address: &Address) -> Result<u64, VaultError> {
        let vault = self.vault(address)?;
        Ok(self.tokens.balance(&vault.token_account)?)
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// Create the vault for `owner`, holding `mint`, and open its token
    /// account. Returns the vault address.
    ///
    /// # Errors
    ///
    /// [`VaultError::VaultAlreadyExists`] if `owner` already has one.
    pub fn initialize(&mut self, owner: Address, mint: Address) -> Result<Address, VaultError> {
        let (address, bump) = vault_address(&owner, &self.config.program_id)?;
        if self.store.contains(&address)? {
            tracing::warn!(vault = %address, owner = %owner, "vault already exists");
            return Err(VaultError::VaultAlreadyExists(address));
        }

        let token_account = self.token_account_address(&address, &mint)?;
        let vault = Vault::new(address, bump, owner, mint, token_account);
        vault.check_invariants()?;
        let record = vault.encode()?;

        match self.tokens.account(&token_account) {
            // Someone funded the address before the vault existed. Adopt it
            // only if it is already shaped like the vault's own account.
            Some(existing) if existing.owner == address && existing.mint == mint => {}
            Some(_) => return Err(VaultError::TokenAccountMismatch(token_account)),
            None => self.tokens.open_account(token_account, address, mint)?,
        }
        self.store.write(address, record)?;

        tracing::info!(vault = %address, owner = %owner, mint = %mint, bump, "vault initialized");
        Ok(address)
    }

    // -----------------------------------------------------------------------
    // Instruction Processing
    // -----------------------------------------------------------------------

    /// Run `instruction` from `caller` against the vault at `vault_address`.
    pub fn process(
        &mut self,
        caller: Address,
        vault_address: Address,
        instruction: Instruction,
    ) -> Result<InstructionOutcome, VaultError> {
        let name = instruction.name();
        match self.run(caller, vault_address, instruction) {
            Ok(outcome) => {
                tracing::info!(
                    vault = %vault_address,
                    caller = %caller,
                    instruction = name,
                    ?outcome,
                    "instruction committed"
                );
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(
                    vault = %vault_address,
                    caller = %caller,
                    instruction = name,
                    error = %err,
                    "instruction rejected"
                );
                Err(err)
            }
        }
    }

    fn run(
        &mut self,
        caller: Address,
        vault_address: Address,
        instruction: Instruction,
    ) -> Result<InstructionOutcome, VaultError> {
        let mut vault = self.vault(&vault_address)?;
        let now = self.clock.unix_timestamp();

        vault.authorize(&caller, instruction.action_class())?;

        let step = match instruction {
            Instruction::Deposit { amount } => self.deposit_step(&vault, caller, amount)?,
            Instruction::Withdraw { amount } => {
                self.withdraw_step(&mut vault, caller, amount, now)?
            }
            Instruction::SetTimelock { duration_secs } => {
                let lock_until =
                    vault.set_timelock(duration_secs, now, self.config.max_timelock_secs)?;
                Step::record_only(InstructionOutcome::TimelockSet { lock_until })
            }
            Instruction::AddDelegate { delegate } => {
                let inserted = vault.add_delegate(delegate, self.config.max_delegates)?;
                Step::record_only(InstructionOutcome::DelegateAdded { delegate, inserted })
            }
            Instruction::RemoveDelegate { delegate } => {
                vault.remove_delegate(&delegate)?;
                Step::record_only(InstructionOutcome::DelegateRemoved { delegate })
            }
            Instruction::SetMultisig { threshold, signers } => {
                let count = signers.len();
                let cancelled =
                    vault.configure_multisig(threshold, signers, self.config.max_multisig_signers)?;
                Step::record_only(InstructionOutcome::MultisigConfigured {
                    threshold,
                    signers: count,
                    cancelled,
                })
            }
            Instruction::ApproveTransaction { id } => {
                self.approve_step(&mut vault, caller, id, now)?
            }
            Instruction::ExecuteTransaction { id } => {
                let movement = self.execute_proposal(&mut vault, id, now)?;
                Step {
                    outcome: InstructionOutcome::Executed { id },
                    movement,
                }
            }
            Instruction::SetWithdrawalLimit { limit } => {
                let previous = vault.set_withdrawal_limit(limit);
                Step::record_only(InstructionOutcome::WithdrawalLimitSet { previous, limit })
            }
            Instruction::InitiateOwnershipTransfer { new_owner } => {
                let proposal = vault.initiate_ownership_transfer(
                    new_owner,
                    now,
                    self.config.pending_transfer_policy,
                    self.config.max_open_proposals,
                )?;
                Step::record_only(InstructionOutcome::OwnershipTransferInitiated {
                    new_owner,
                    proposal,
                })
            }
            Instruction::AcceptOwnership => {
                let previous_owner = vault.accept_ownership()?;
                tracing::info!(
                    vault = %vault.address,
                    from = %previous_owner,
                    to = %caller,
                    "ownership accepted"
                );
                Step::record_only(InstructionOutcome::OwnershipAccepted {
                    previous_owner,
                    new_owner: caller,
                })
            }
            Instruction::CancelOwnershipTransfer => {
                let target = vault.cancel_ownership_transfer()?;
                Step::record_only(InstructionOutcome::OwnershipTransferCancelled { target })
            }
        };

        self.commit(vault, step)
    }

    /// Steps 4–6: invariants, encode, move tokens, write.
    fn commit(&mut self, vault: Vault, step: Step) -> Result<InstructionOutcome, VaultError> {
        vault.check_invariants()?;
        let record = vault.encode()?;
        if let Some(m) = step.movement {
            self.tokens
                .transfer(&m.from, &m.to, &m.authority, m.amount)?;
        }
        self.store.write(vault.address, record)?;
        Ok(step.outcome)
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn deposit_step(&self, vault: &Vault, caller: Address, amount: u64) -> Result<Step, VaultError> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let source = self.holder_account(vault, &caller)?;
        Ok(Step {
            outcome: InstructionOutcome::Deposited { amount },
            movement: Some(TokenMovement {
                from: source,
                to: vault.token_account,
                authority: caller,
                amount,
            }),
        })
    }

    fn withdraw_step(
        &self,
        vault: &mut Vault,
        caller: Address,
        amount: u64,
        now: u64,
    ) -> Result<Step, VaultError> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let destination = self.holder_account(vault, &caller)?;
        vault.check_timelock(now)?;
        vault.check_withdrawal_limit(amount)?;

        if vault.requires_multisig() {
            let id = vault.open_proposal(
                TransactionKind::Withdraw {
                    amount,
                    destination,
                },
                caller,
                now,
                self.config.max_open_proposals,
            )?;
            tracing::info!(vault = %vault.address, caller = %caller, id, amount, "withdrawal proposed");
            return Ok(Step::record_only(InstructionOutcome::ProposalCreated { id }));
        }

        let movement = self.payout(vault, destination, amount)?;
        tracing::info!(vault = %vault.address, caller = %caller, amount, "withdrawal executed");
        Ok(Step {
            outcome: InstructionOutcome::Withdrawn {
                amount,
                destination,
            },
            movement: Some(movement),
        })
    }

    fn approve_step(
        &self,
        vault: &mut Vault,
        caller: Address,
        id: u64,
        now: u64,
    ) -> Result<Step, VaultError> {
        let signatures = vault.sign_transaction(id, caller)?;
        let threshold = vault.multisig_threshold;
        if signatures < usize::from(threshold) {
            return Ok(Step::record_only(InstructionOutcome::Approval(
                ApprovalOutcome::Pending {
                    signatures,
                    threshold,
                },
            )));
        }

        match self.execute_proposal(vault, id, now) {
            Ok(movement) => Ok(Step {
                outcome: InstructionOutcome::Approval(ApprovalOutcome::Executed { id }),
                movement,
            }),
            Err(reason) if reason.is_deferrable() => {
                tracing::warn!(
                    vault = %vault.address,
                    id,
                    reason = %reason,
                    "quorum reached but execution blocked"
                );
                Ok(Step::record_only(InstructionOutcome::Approval(
                    ApprovalOutcome::Blocked { id, reason },
                )))
            }
            Err(err) => Err(err),
        }
    }

    /// Apply proposal `id`, which must hold quorum. Guards are re-checked
    /// against the current state; the record is only touched once they
    /// all pass.
    fn execute_proposal(
        &self,
        vault: &mut Vault,
        id: u64,
        now: u64,
    ) -> Result<Option<TokenMovement>, VaultError> {
        let kind = vault.executable_transaction(id)?.kind;
        match kind {
            TransactionKind::Withdraw {
                amount,
                destination,
            } => {
                vault.check_timelock(now)?;
                vault.check_withdrawal_limit(amount)?;
                let movement = self.payout(vault, destination, amount)?;
                vault.mark_executed(id);
                tracing::info!(vault = %vault.address, id, amount, "proposal executed");
                Ok(Some(movement))
            }
            TransactionKind::TransferOwnership { new_owner } => {
                vault.mark_executed(id);
                let previous = vault.apply_ownership_change(new_owner);
                tracing::info!(
                    vault = %vault.address,
                    id,
                    from = %previous,
                    to = %new_owner,
                    "ownership transferred by quorum"
                );
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// A vault-to-holder movement, after confirming the vault can cover it.
    fn payout(
        &self,
        vault: &Vault,
        destination: Address,
        amount: u64,
    ) -> Result<TokenMovement, VaultError> {
        let available = self.tokens.balance(&vault.token_account)?;
        if available < amount {
            return Err(VaultError::InsufficientFunds {
                available,
                requested: amount,
            });
        }
        Ok(TokenMovement {
            from: vault.token_account,
            to: destination,
            authority: vault.address,
            amount,
        })
    }

    /// `holder`'s token account for the vault's mint, which must exist and
    /// belong to `holder`.
    fn holder_account(&self, vault: &Vault, holder: &Address) -> Result<Address, VaultError> {
        let account = self.token_account_address(holder, &vault.mint)?;
        match self.tokens.account(&account) {
            None => Err(VaultError::TokenAccountNotFound(account)),
            Some(a) if a.owner != *holder || a.mint != vault.mint => {
                Err(VaultError::TokenAccountMismatch(account))
            }
            Some(_) => Ok(account),
        }
    }

    // -----------------------------------------------------------------------
    // Convenience Wrappers
    // -----------------------------------------------------------------------

    /// [`Instruction::Deposit`].
    pub fn deposit(
        &mut self,
        caller: Address,
        vault: Address,
        amount: u64,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::Deposit { amount })
    }

    /// [`Instruction::Withdraw`].
    pub fn withdraw(
        &mut self,
        caller: Address,
        vault: Address,
        amount: u64,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::Withdraw { amount })
    }

    /// [`Instruction::SetTimelock`].
    pub fn set_timelock(
        &mut self,
        caller: Address,
        vault: Address,
        duration_secs: u64,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::SetTimelock { duration_secs })
    }

    /// [`Instruction::AddDelegate`].
    pub fn add_delegate(
        &mut self,
        caller: Address,
        vault: Address,
        delegate: Address,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::AddDelegate { delegate })
    }

    /// [`Instruction::RemoveDelegate`].
    pub fn remove_delegate(
        &mut self,
        caller: Address,
        vault: Address,
        delegate: Address,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::RemoveDelegate { delegate })
    }

    /// [`Instruction::SetMultisig`].
    pub fn set_multisig(
        &mut self,
        caller: Address,
        vault: Address,
        threshold: u8,
        signers: Vec<Address>,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::SetMultisig { threshold, signers })
    }

    /// [`Instruction::ApproveTransaction`].
    pub fn approve_transaction(
        &mut self,
        caller: Address,
        vault: Address,
        id: u64,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::ApproveTransaction { id })
    }

    /// [`Instruction::ExecuteTransaction`].
    pub fn execute_transaction(
        &mut self,
        caller: Address,
        vault: Address,
        id: u64,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::ExecuteTransaction { id })
    }

    /// [`Instruction::SetWithdrawalLimit`].
    pub fn set_withdrawal_limit(
        &mut self,
        caller: Address,
        vault: Address,
        limit: u64,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::SetWithdrawalLimit { limit })
    }

    /// [`Instruction::InitiateOwnershipTransfer`].
    pub fn initiate_ownership_transfer(
        &mut self,
        caller: Address,
        vault: Address,
        new_owner: Address,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::InitiateOwnershipTransfer { new_owner })
    }

    /// [`Instruction::AcceptOwnership`].
    pub fn accept_ownership(
        &mut self,
        caller: Address,
        vault: Address,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::AcceptOwnership)
    }

    /// [`Instruction::CancelOwnershipTransfer`].
    pub fn cancel_ownership_transfer(
        &mut self,
        caller: Address,
        vault: Address,
    ) -> Result<InstructionOutcome, VaultError> {
        self.process(caller, vault, Instruction::CancelOwnershipTransfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffer_protocol::clock::ManualClock;
    use coffer_protocol::token::MemoryTokenLedger;

    use crate::store::MemoryVaultStore;

    type Ledger = VaultLedger<MemoryVaultStore, MemoryTokenLedger, ManualClock>;

    const OWNER: Address = Address::new([1u8; 32]);
    const MINT: Address = Address::new([2u8; 32]);

    fn ledger() -> Ledger {
        VaultLedger::new(
            VaultConfig::default(),
            MemoryVaultStore::new(),
            MemoryTokenLedger::new(),
            ManualClock::new(1_700_000_000),
        )
        .unwrap()
    }

    #[test]
    fn invalid_config_refused() {
        let config = VaultConfig {
            max_delegates: 0,
            ..VaultConfig::default()
        };
        assert!(VaultLedger::new(
            config,
            MemoryVaultStore::new(),
            MemoryTokenLedger::new(),
            ManualClock::new(0)
        )
        .is_err());
    }

    #[test]
    fn initialize_derives_address_and_opens_account() {
        let mut l = ledger();
        let addr = l.initialize(OWNER, MINT).unwrap();
        assert_eq!(addr, l.vault_address(&OWNER).unwrap());

        let vault = l.vault(&addr).unwrap();
        assert_eq!(vault.owner, OWNER);
        assert_eq!(vault.mint, MINT);
        assert!(!vault.address.is_on_curve());
        let account = l.tokens().account(&vault.token_account).unwrap();
        assert_eq!(account.owner, addr);
        assert_eq!(l.query_balance(&addr).unwrap(), 0);
    }

    #[test]
    fn second_initialize_fails() {
        let mut l = ledger();
        let addr = l.initialize(OWNER, MINT).unwrap();
        assert_eq!(
            l.initialize(OWNER, MINT),
            Err(VaultError::VaultAlreadyExists(addr))
        );
    }

    #[test]
    fn unknown_vault() {
        let mut l = ledger();
        let ghost = Address::new([9u8; 32]);
        assert_eq!(
            l.withdraw(OWNER, ghost, 1),
            Err(VaultError::VaultNotFound(ghost))
        );
        assert_eq!(l.query_balance(&ghost), Err(VaultError::VaultNotFound(ghost)));
    }

    #[test]
    fn deposit_needs_a_token_account() {
        let mut l = ledger();
        let addr = l.initialize(OWNER, MINT).unwrap();
        let missing = l.token_account_address(&OWNER, &MINT).unwrap();
        assert_eq!(
            l.deposit(OWNER, addr, 10),
            Err(VaultError::TokenAccountNotFound(missing))
        );
    }

    #[test]
    fn zero_amounts_rejected() {
        let mut l = ledger();
        let addr = l.initialize(OWNER, MINT).unwrap();
        l.open_token_account(&OWNER, &MINT).unwrap();
        assert_eq!(l.deposit(OWNER, addr, 0), Err(VaultError::InvalidAmount));
        assert_eq!(l.withdraw(OWNER, addr, 0), Err(VaultError::InvalidAmount));
    }

    #[test]
    fn failed_transfer_leaves_record_untouched() {
        let mut l = ledger();
        let addr = l.initialize(OWNER, MINT).unwrap();
        l.open_token_account(&OWNER, &MINT).unwrap();
        let before = l.vault(&addr).unwrap();

        assert_eq!(
            l.deposit(OWNER, addr, 5),
            Err(VaultError::InsufficientFunds {
                available: 0,
                requested: 5
            })
        );
        assert_eq!(l.vault(&addr).unwrap(), before);
    }
}
