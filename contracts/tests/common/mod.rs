//! Shared fixture for the vault integration tests.
//!
//! Every fixture starts from the same place: a freshly initialized vault
//! whose owner holds [`OWNER_FUNDS`] in their own token account, a manual
//! clock at [`START`], and the default configuration unless told otherwise.

#![allow(dead_code)]

use coffer_contracts::{MemoryVaultStore, Vault, VaultLedger};
use coffer_protocol::clock::{Clock, ManualClock};
use coffer_protocol::config::VaultConfig;
use coffer_protocol::crypto::CofferKeypair;
use coffer_protocol::identity::Address;
use coffer_protocol::token::{MemoryTokenLedger, TokenLedger};
use tracing_subscriber::EnvFilter;

pub type Ledger = VaultLedger<MemoryVaultStore, MemoryTokenLedger, ManualClock>;

/// Clock reading at the start of every test (2023-11-14T22:13:20Z).
pub const START: u64 = 1_700_000_000;

/// Tokens minted to the owner's account at setup.
pub const OWNER_FUNDS: u64 = 10_000_000;

/// Route `tracing` output through the test harness. `RUST_LOG` overrides
/// the default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A fresh keyed identity.
pub fn keyed() -> Address {
    CofferKeypair::generate().address()
}

pub struct Fixture {
    pub ledger: Ledger,
    pub vault: Address,
    pub owner: Address,
    pub mint: Address,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(VaultConfig::default())
    }

    pub fn with_config(config: VaultConfig) -> Self {
        init_tracing();
        let owner = keyed();
        let mint = Address::new_unique();
        let mut ledger = VaultLedger::new(
            config,
            MemoryVaultStore::new(),
            MemoryTokenLedger::new(),
            ManualClock::new(START),
        )
        .unwrap();

        let vault = ledger.initialize(owner, mint).unwrap();
        let owner_account = ledger.open_token_account(&owner, &mint).unwrap();
        ledger
            .tokens_mut()
            .mint_to(&owner_account, OWNER_FUNDS)
            .unwrap();

        Self {
            ledger,
            vault,
            owner,
            mint,
        }
    }

    /// A fixture whose vault already holds `amount`.
    pub fn funded(amount: u64) -> Self {
        let mut f = Self::new();
        f.ledger.deposit(f.owner, f.vault, amount).unwrap();
        f
    }

    /// A new identity with an empty token account for the vault's mint.
    pub fn identity(&mut self) -> Address {
        let who = keyed();
        self.ledger.open_token_account(&who, &self.mint).unwrap();
        who
    }

    /// Balance of `holder`'s token account.
    pub fn balance_of(&self, holder: &Address) -> u64 {
        let account = self
            .ledger
            .token_account_address(holder, &self.mint)
            .unwrap();
        self.ledger.tokens().balance(&account).unwrap()
    }

    pub fn vault_balance(&self) -> u64 {
        self.ledger.query_balance(&self.vault).unwrap()
    }

    /// Current committed vault record.
    pub fn state(&self) -> Vault {
        self.ledger.vault(&self.vault).unwrap()
    }

    pub fn advance(&self, secs: u64) {
        self.ledger.clock().advance(secs);
    }

    pub fn now(&self) -> u64 {
        self.ledger.clock().unix_timestamp()
    }
}
