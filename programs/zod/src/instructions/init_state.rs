//! Registry initialization and collateral listing

use crate::config::{SYNTH_DECIMALS, SYNTH_LIQ_FEE, SYNTH_SYMBOL, SYNTH_WEIGHT};
use crate::state::{CollateralInfo, Registry};
use pinocchio::pubkey::Pubkey;
use zod_common::{Symbol, ZodError};

/// Initialize the protocol registry. The synthetic token's risk parameters
/// are fixed at deployment, only the mint is caller-supplied.
#[allow(clippy::too_many_arguments)]
pub fn process_init_state(
    registry: &mut Registry,
    admin: Pubkey,
    lending_state: Pubkey,
    lending_cache: Pubkey,
    lending_margin: Pubkey,
    synth_mint: Pubkey,
    state_nonce: u8,
    lending_margin_nonce: u8,
) -> Result<(), ZodError> {
    if registry.admin != Pubkey::default() {
        return Err(ZodError::InvalidAccount);
    }

    let synth_info = CollateralInfo {
        mint: synth_mint,
        oracle_symbol: Symbol::new(SYNTH_SYMBOL),
        decimals: SYNTH_DECIMALS,
        _padding: 0,
        weight: SYNTH_WEIGHT,
        liq_fee: SYNTH_LIQ_FEE,
        _padding2: [0; 2],
    };

    registry.initialize_in_place(
        admin,
        lending_state,
        lending_cache,
        lending_margin,
        synth_mint,
        synth_info,
        state_nonce,
        lending_margin_nonce,
    );
    Ok(())
}

/// Register a collateral asset. Admin only.
pub fn process_add_vault(
    registry: &mut Registry,
    caller: &Pubkey,
    vault: Pubkey,
    info: CollateralInfo,
) -> Result<u16, ZodError> {
    if caller != &registry.admin {
        return Err(ZodError::Unauthorized);
    }
    registry.add_vault(vault, info)
}
