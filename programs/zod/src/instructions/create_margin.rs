//! Margin account creation

use crate::state::Margin;
use pinocchio::pubkey::Pubkey;
use zod_common::ZodError;

/// Initialize a margin account, binding it to its authority and the token
/// account that will receive minted tokens.
pub fn process_create_margin(
    margin: &mut Margin,
    authority: Pubkey,
    token_account: Pubkey,
    nonce: u8,
) -> Result<(), ZodError> {
    if margin.authority != Pubkey::default() {
        return Err(ZodError::InvalidAccount);
    }
    margin.initialize_in_place(authority, token_account, nonce);
    Ok(())
}
