//! PDA derivation
//!
//! Seeds are fixed protocol tags; clients re-derive every address from them
//! without querying the chain.

use pinocchio::pubkey::{find_program_address, Pubkey};

/// Registry PDA tag
pub const REGISTRY_SEED: &[u8] = b"zodv12";
/// Margin account PDA tag
pub const MARGIN_SEED: &[u8] = b"zodmarginv2";
/// Vault PDA tag
pub const VAULT_SEED: &[u8] = b"vault";

/// Derive the registry PDA: `["zodv12"]`
pub fn derive_registry_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    find_program_address(&[REGISTRY_SEED], program_id)
}

/// Derive a margin account PDA: `[authority, registry, "zodmarginv2"]`
pub fn derive_margin_pda(
    authority: &Pubkey,
    registry: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    find_program_address(
        &[authority.as_ref(), registry.as_ref(), MARGIN_SEED],
        program_id,
    )
}

/// Derive a collateral vault PDA: `["vault", registry, mint]`
pub fn derive_vault_pda(registry: &Pubkey, mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    find_program_address(
        &[VAULT_SEED, registry.as_ref(), mint.as_ref()],
        program_id,
    )
}
