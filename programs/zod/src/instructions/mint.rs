//! Synthetic token minting

use crate::state::{Cache, Margin, Registry};
use zod_common::{Fixed, PriceSource, ZodError};

/// Mint `amount` synthetic tokens against the account's collateral. The
/// minted balance and the registry's total supply are staged together and
/// committed only if the projected margin holds.
pub fn process_mint(
    margin: &mut Margin,
    registry: &mut Registry,
    cache: &Cache,
    amount: u64,
    now: u64,
    price_source: PriceSource,
) -> Result<(), ZodError> {
    if amount == 0 {
        return Err(ZodError::InvalidAmount);
    }
    let minted = Fixed::from_u64(amount);

    let mut staged = *margin;
    staged.mutate_minted(minted, registry.soc_loss_multiplier)?;

    let omf = staged.omf(registry, cache, now, price_source)?;
    let imf = staged.imf(registry)?;
    if omf <= imf {
        return Err(ZodError::InsufficientMargin);
    }

    registry.mutate_total_minted(minted)?;
    *margin = staged;
    Ok(())
}
