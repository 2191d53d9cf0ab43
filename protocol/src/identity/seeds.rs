//! Canonical derivations for the two kinds of program-owned accounts.
//!
//! ```text
//! vault record         = derive(["vault", owner],          program_id)
//! token account        = derive(["token", holder, mint],   program_id)
//! ```
//!
//! The holder of a token account may itself be a derived address: a
//! vault's balance lives in the token account derived from
//! `["token", vault_address, mint]`.

use super::address::{Address, AddressError};
use crate::config::{TOKEN_ACCOUNT_SEED, VAULT_SEED};

/// The vault record address for `owner`, with its bump.
pub fn vault_address(owner: &Address, program_id: &Address) -> Result<(Address, u8), AddressError> {
    Address::find_program_address(&[VAULT_SEED, owner.as_ref()], program_id)
}

/// The token account that `holder` uses for `mint`.
pub fn associated_token_address(
    holder: &Address,
    mint: &Address,
    program_id: &Address,
) -> Result<Address, AddressError> {
    Address::find_program_address(&[TOKEN_ACCOUNT_SEED, holder.as_ref(), mint.as_ref()], program_id)
        .map(|(address, _bump)| address)
}
