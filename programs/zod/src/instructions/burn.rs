//! Synthetic token burning

use crate::state::{Margin, Registry};
use zod_common::{Fixed, ZodError};

/// Burn `amount` synthetic tokens, reducing the account's debt and the
/// registry's total supply. Burning only improves margin, so there is no
/// solvency check; burning more than the outstanding balance fails.
pub fn process_burn(
    margin: &mut Margin,
    registry: &mut Registry,
    amount: u64,
) -> Result<(), ZodError> {
    if amount == 0 {
        return Err(ZodError::InvalidAmount);
    }
    let burned = Fixed::from_u64(amount);

    let balance = margin.actual_minted(registry.soc_loss_multiplier)?;
    if burned > balance {
        return Err(ZodError::InvalidAmount);
    }

    margin.mutate_minted(burned.checked_neg()?, registry.soc_loss_multiplier)?;
    registry.mutate_total_minted(burned.checked_neg()?)?;
    Ok(())
}
