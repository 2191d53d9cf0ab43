// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Coffer Protocol: Core Library
//!
//! The ground the vault engine stands on: addresses and how they are
//! derived, the clock, the token ledger contract, and the knobs an operator
//! can turn. The vault state machine itself lives in `coffer-contracts`.
//!
//! ## Modules
//!
//! - **config**: Protocol constants and the runtime [`config::VaultConfig`].
//! - **crypto**: SHA-256 and Ed25519 keypairs. Don't roll your own.
//! - **identity**: 32-byte Base58 addresses, keyed or program-derived.
//! - **clock**: Injectable time. Production reads the host, tests don't.
//! - **token**: The token-movement contract plus an in-memory ledger.
//!
//! ## Design Philosophy
//!
//! 1. Nothing in here reads ambient state. Time and balances are handed in.
//! 2. Every fallible call returns a typed error; nothing panics on bad input.
//! 3. If it touches money, it has tests. Plural.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod token;
