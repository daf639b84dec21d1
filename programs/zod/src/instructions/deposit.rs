//! Collateral deposit

use crate::state::{Cache, Margin, Registry};
use pinocchio::pubkey::Pubkey;
use zod_common::{Fixed, ZodError};

/// Credit `amount` native units of `mint` to the margin account. Deposits
/// can only improve margin, so no solvency check is needed.
pub fn process_deposit(
    margin: &mut Margin,
    registry: &Registry,
    cache: &Cache,
    mint: &Pubkey,
    amount: u64,
) -> Result<(), ZodError> {
    if amount == 0 {
        return Err(ZodError::InvalidAmount);
    }
    let index = registry
        .collateral_index(mint)
        .ok_or(ZodError::CollateralNotFound)?;
    let rates = &cache.rates[index];

    margin.mutate_collateral(
        index,
        Fixed::from_u64(amount),
        rates.supply_multiplier,
        rates.borrow_multiplier,
    )
}
