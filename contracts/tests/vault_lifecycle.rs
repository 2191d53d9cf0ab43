//! Integration tests for single-signer vault flows.
//!
//! Deposits, direct withdrawals, timelocks, withdrawal limits and delegates,
//! driven through the ledger exactly as a client would drive them.

mod common;

use coffer_contracts::{Instruction, InstructionOutcome, VaultError};
use coffer_protocol::config::VaultConfig;
use common::{Fixture, OWNER_FUNDS, START};

// ---------------------------------------------------------------------------
// Deposit & Balance
// ---------------------------------------------------------------------------

#[test]
fn deposit_then_query_balance() {
    let mut f = Fixture::new();
    assert_eq!(f.vault_balance(), 0);

    let outcome = f.ledger.deposit(f.owner, f.vault, 1_000_000).unwrap();
    assert_eq!(outcome, InstructionOutcome::Deposited { amount: 1_000_000 });
    assert_eq!(f.vault_balance(), 1_000_000);
    assert_eq!(f.balance_of(&f.owner), OWNER_FUNDS - 1_000_000);
}

#[test]
fn only_owner_deposits() {
    let mut f = Fixture::new();
    let stranger = f.identity();
    let account = f.ledger.token_account_address(&stranger, &f.mint).unwrap();
    f.ledger.tokens_mut().mint_to(&account, 100).unwrap();

    assert_eq!(
        f.ledger.deposit(stranger, f.vault, 100),
        Err(VaultError::NotVaultOwner)
    );
    assert_eq!(f.vault_balance(), 0);
}

#[test]
fn deposit_beyond_owner_balance_fails() {
    let mut f = Fixture::new();
    assert_eq!(
        f.ledger.deposit(f.owner, f.vault, OWNER_FUNDS + 1),
        Err(VaultError::InsufficientFunds {
            available: OWNER_FUNDS,
            requested: OWNER_FUNDS + 1
        })
    );
    assert_eq!(f.balance_of(&f.owner), OWNER_FUNDS);
}

#[test]
fn vault_address_is_derived_from_owner() {
    let f = Fixture::new();
    assert_eq!(f.ledger.vault_address(&f.owner).unwrap(), f.vault);
    let state = f.state();
    assert_eq!(state.address, f.vault);
    assert_eq!(
        state.token_account,
        f.ledger.token_account_address(&f.vault, &f.mint).unwrap()
    );
    assert!(!f.vault.is_on_curve());
}

// ---------------------------------------------------------------------------
// Direct Withdrawal
// ---------------------------------------------------------------------------

#[test]
fn owner_withdraws_to_own_account() {
    let mut f = Fixture::funded(1_000_000);
    let outcome = f.ledger.withdraw(f.owner, f.vault, 400_000).unwrap();
    assert!(matches!(
        outcome,
        InstructionOutcome::Withdrawn {
            amount: 400_000,
            ..
        }
    ));
    assert_eq!(f.vault_balance(), 600_000);
    assert_eq!(f.balance_of(&f.owner), OWNER_FUNDS - 600_000);
}

#[test]
fn overdraw_fails_and_changes_nothing() {
    let mut f = Fixture::funded(100);
    let before = f.state();
    assert_eq!(
        f.ledger.withdraw(f.owner, f.vault, 101),
        Err(VaultError::InsufficientFunds {
            available: 100,
            requested: 101
        })
    );
    assert_eq!(f.state(), before);
    assert_eq!(f.vault_balance(), 100);
}

#[test]
fn stranger_cannot_withdraw() {
    let mut f = Fixture::funded(1_000);
    let stranger = f.identity();
    assert_eq!(
        f.ledger.withdraw(stranger, f.vault, 1),
        Err(VaultError::NotAuthorized)
    );
}

// ---------------------------------------------------------------------------
// Timelock
// ---------------------------------------------------------------------------

#[test]
fn timelock_blocks_until_expiry() {
    let mut f = Fixture::funded(1_000_000);
    assert_eq!(
        f.ledger.set_timelock(f.owner, f.vault, 10).unwrap(),
        InstructionOutcome::TimelockSet {
            lock_until: START + 10
        }
    );

    assert_eq!(
        f.ledger.withdraw(f.owner, f.vault, 500_000),
        Err(VaultError::VaultLocked {
            until: START + 10,
            now: START
        })
    );

    f.advance(10);
    f.ledger.withdraw(f.owner, f.vault, 500_000).unwrap();
    assert_eq!(f.vault_balance(), 500_000);
}

#[test]
fn deposits_allowed_while_locked() {
    let mut f = Fixture::new();
    f.ledger.set_timelock(f.owner, f.vault, 3_600).unwrap();
    f.ledger.deposit(f.owner, f.vault, 50).unwrap();
    assert_eq!(f.vault_balance(), 50);
}

#[test]
fn timelock_can_be_shortened() {
    let mut f = Fixture::funded(10);
    f.ledger.set_timelock(f.owner, f.vault, 86_400).unwrap();
    f.ledger.set_timelock(f.owner, f.vault, 0).unwrap();
    f.ledger.withdraw(f.owner, f.vault, 10).unwrap();
}

#[test]
fn timelock_ceiling_from_config() {
    let mut f = Fixture::with_config(VaultConfig {
        max_timelock_secs: Some(60),
        ..VaultConfig::default()
    });
    assert_eq!(
        f.ledger.set_timelock(f.owner, f.vault, 61),
        Err(VaultError::TimelockTooLong {
            requested: 61,
            max: 60
        })
    );
    assert_eq!(f.state().lock_until, 0);
}

#[test]
fn only_owner_sets_timelock() {
    let mut f = Fixture::new();
    let delegate = f.identity();
    f.ledger.add_delegate(f.owner, f.vault, delegate).unwrap();
    assert_eq!(
        f.ledger.set_timelock(delegate, f.vault, 10),
        Err(VaultError::NotVaultOwner)
    );
}

// ---------------------------------------------------------------------------
// Withdrawal Limit
// ---------------------------------------------------------------------------

#[test]
fn withdrawal_limit_enforced() {
    let mut f = Fixture::funded(1_000_000);
    assert_eq!(
        f.ledger
            .set_withdrawal_limit(f.owner, f.vault, 250_000)
            .unwrap(),
        InstructionOutcome::WithdrawalLimitSet {
            previous: u64::MAX,
            limit: 250_000
        }
    );

    assert_eq!(
        f.ledger.withdraw(f.owner, f.vault, 300_000),
        Err(VaultError::WithdrawalLimitExceeded {
            limit: 250_000,
            requested: 300_000
        })
    );
    f.ledger.withdraw(f.owner, f.vault, 250_000).unwrap();
    assert_eq!(f.vault_balance(), 750_000);
}

#[test]
fn timelock_checked_before_limit() {
    let mut f = Fixture::funded(1_000);
    f.ledger.set_withdrawal_limit(f.owner, f.vault, 1).unwrap();
    f.ledger.set_timelock(f.owner, f.vault, 5).unwrap();
    assert!(matches!(
        f.ledger.withdraw(f.owner, f.vault, 2),
        Err(VaultError::VaultLocked { .. })
    ));
}

// ---------------------------------------------------------------------------
// Delegates
// ---------------------------------------------------------------------------

#[test]
fn delegate_withdraws_until_removed() {
    let mut f = Fixture::funded(1_000_000);
    let d = f.identity();

    f.ledger.add_delegate(f.owner, f.vault, d).unwrap();
    f.ledger.withdraw(d, f.vault, 200_000).unwrap();
    assert_eq!(f.balance_of(&d), 200_000);
    assert_eq!(f.vault_balance(), 800_000);

    f.ledger.remove_delegate(f.owner, f.vault, d).unwrap();
    assert_eq!(
        f.ledger.withdraw(d, f.vault, 1),
        Err(VaultError::NotAuthorized)
    );
}

#[test]
fn delegates_cannot_administer() {
    let mut f = Fixture::new();
    let d = f.identity();
    f.ledger.add_delegate(f.owner, f.vault, d).unwrap();
    let other = f.identity();

    assert_eq!(
        f.ledger.add_delegate(d, f.vault, other),
        Err(VaultError::NotVaultOwner)
    );
    assert_eq!(
        f.ledger.set_withdrawal_limit(d, f.vault, 0),
        Err(VaultError::NotVaultOwner)
    );
}

#[test]
fn delegate_subject_to_guards() {
    let mut f = Fixture::funded(1_000);
    let d = f.identity();
    f.ledger.add_delegate(f.owner, f.vault, d).unwrap();
    f.ledger.set_withdrawal_limit(f.owner, f.vault, 10).unwrap();
    assert!(matches!(
        f.ledger.withdraw(d, f.vault, 11),
        Err(VaultError::WithdrawalLimitExceeded { .. })
    ));
}

#[test]
fn removing_absent_delegate_fails() {
    let mut f = Fixture::new();
    let kept = f.identity();
    let absent = f.identity();
    f.ledger.add_delegate(f.owner, f.vault, kept).unwrap();

    assert_eq!(
        f.ledger.remove_delegate(f.owner, f.vault, absent),
        Err(VaultError::DelegateNotFound(absent))
    );
    assert!(f.state().delegates.contains(&kept));
    assert_eq!(f.state().delegates.len(), 1);
}

#[test]
fn duplicate_delegate_reported_not_inserted() {
    let mut f = Fixture::new();
    let d = f.identity();
    f.ledger.add_delegate(f.owner, f.vault, d).unwrap();
    assert_eq!(
        f.ledger.add_delegate(f.owner, f.vault, d).unwrap(),
        InstructionOutcome::DelegateAdded {
            delegate: d,
            inserted: false
        }
    );
}

#[test]
fn delegate_capacity_from_config() {
    let mut f = Fixture::with_config(VaultConfig {
        max_delegates: 2,
        ..VaultConfig::default()
    });
    for _ in 0..2 {
        let d = f.identity();
        f.ledger.add_delegate(f.owner, f.vault, d).unwrap();
    }
    let extra = f.identity();
    assert_eq!(
        f.ledger.add_delegate(f.owner, f.vault, extra),
        Err(VaultError::MaxDelegatesReached { max: 2 })
    );
}

#[test]
fn withdrawal_requires_destination_account() {
    let mut f = Fixture::funded(1_000);
    // A delegate that never opened a token account.
    let d = common::keyed();
    f.ledger.add_delegate(f.owner, f.vault, d).unwrap();
    let expected = f.ledger.token_account_address(&d, &f.mint).unwrap();
    assert_eq!(
        f.ledger.withdraw(d, f.vault, 1),
        Err(VaultError::TokenAccountNotFound(expected))
    );
}

// ---------------------------------------------------------------------------
// Wire Format
// ---------------------------------------------------------------------------

#[test]
fn instructions_accepted_as_json() {
    let mut f = Fixture::funded(500);
    let ix: Instruction = serde_json::from_str(r#"{"withdraw":{"amount":200}}"#).unwrap();
    f.ledger.process(f.owner, f.vault, ix).unwrap();
    assert_eq!(f.vault_balance(), 300);
}

#[test]
fn vault_record_renders_as_json() {
    let f = Fixture::new();
    let json = f.state().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["owner"], serde_json::json!(f.owner.to_string()));
    assert_eq!(value["multisig_threshold"], 1);
    assert_eq!(value["max_withdrawal_limit"], u64::MAX);
}
