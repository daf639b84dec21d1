//! Bankruptcy settlement
//!
//! Once liquidation has stripped an account down to dust, a settler burns
//! their own synthetic tokens to retire the target's remaining debt and is
//! compensated in quote collateral. The compensation comes out of the
//! insurance fund; whatever the fund cannot cover is socialized across all
//! outstanding minted balances.

use crate::config::PERMIL;
use crate::state::{Cache, Margin, Registry};
use zod_common::{Fixed, PriceSource, ZodError};

/// Outcome of a settlement, for logging and keeper consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementResult {
    /// Debt written off the bankrupt account
    pub written_off: Fixed,
    /// Smol USD drawn from the insurance fund
    pub insurance_drawn: i64,
    /// Per-minted-unit loss fraction socialized, zero when the fund covered
    /// everything
    pub socialized: Fixed,
}

/// The quote asset compensating settlers is by convention the first listed
/// collateral.
const QUOTE_INDEX: usize = 0;

pub fn process_settle_bankruptcy(
    liqee: &mut Margin,
    liqor: &mut Margin,
    registry: &mut Registry,
    cache: &Cache,
    now: u64,
    price_source: PriceSource,
) -> Result<SettlementResult, ZodError> {
    if registry.collateral_count == 0 {
        return Err(ZodError::CollateralNotFound);
    }
    if !liqee.has_no_collateral_above_dust(registry, cache, now, price_source)? {
        return Err(ZodError::NotBankrupt);
    }

    let soc = registry.soc_loss_multiplier;
    let debt = liqee.actual_minted(soc)?;
    if debt.is_zero() {
        return Err(ZodError::AlreadySettled);
    }

    let quote_fee = registry.collaterals[QUOTE_INDEX].liq_fee as i64;
    let compensation_smol = debt
        .floor_i64()?
        .checked_mul(PERMIL + quote_fee)
        .and_then(|v| v.checked_div(PERMIL))
        .ok_or(ZodError::Arithmetic)?;
    let compensation = Fixed::from_int(compensation_smol);

    let rates = &cache.rates[QUOTE_INDEX];
    let mut staged_liqor = *liqor;
    staged_liqor.mutate_minted(debt.checked_neg()?, soc)?;
    staged_liqor.mutate_collateral(
        QUOTE_INDEX,
        compensation,
        rates.supply_multiplier,
        rates.borrow_multiplier,
    )?;

    // precompute every registry change; the write-off and the settler's
    // burn both leave the supply. Nothing is stored until all of the
    // arithmetic is known to succeed.
    let burned = debt.checked_mul(Fixed::from_int(2))?;
    let total_after = registry
        .actual_total_minted()?
        .checked_sub(burned)?
        .max(Fixed::ZERO);
    let total_after_raw = total_after.checked_div(soc)?;

    let fund = registry.insurance as i64;
    let (drawn, socialized) = if compensation_smol > fund {
        let residual = Fixed::from_int(compensation_smol - fund);
        let fraction = residual.checked_div(total_after)?;
        if fraction >= Fixed::ONE || fraction.is_negative() {
            return Err(ZodError::Arithmetic);
        }
        (fund, fraction)
    } else {
        (compensation_smol, Fixed::ZERO)
    };
    let soc_after = Fixed::ONE.checked_add(socialized)?.checked_mul(soc)?;

    registry.total_minted = total_after_raw;
    registry.insurance = (fund - drawn) as u64;
    registry.soc_loss_multiplier = soc_after;
    liqee.write_off();
    *liqor = staged_liqor;
    Ok(SettlementResult {
        written_off: debt,
        insurance_drawn: drawn,
        socialized,
    })
}
