//! Partial liquidation of under-margin accounts
//!
//! A liquidator repays part of the target's minted debt out of their own
//! synthetic balance and receives the target's collateral at a bonus. The
//! repayable amount is capped so a single liquidation never pushes the
//! target past its initial margin requirement.

use crate::config::PERMIL;
use crate::state::{Cache, Margin, Registry};
use pinocchio::pubkey::Pubkey;
use zod_common::{Fixed, PriceSource, ZodError};

/// Outcome of a liquidation, for logging and keeper consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationResult {
    /// Synthetic debt repaid by the liquidator
    pub assets_repaid: Fixed,
    /// Collateral (fee included) transferred to the liquidator
    pub collateral_seized: Fixed,
}

/// Liquidation fee ratio as an exact integer pair: the liquidator's bonus
/// compounds the synthetic's fee with the seized asset's fee. Kept as a
/// ratio so seizure amounts truncate exactly once, in the final division.
fn fee_ratio(registry: &Registry, quote_index: usize) -> Result<(i64, i64), ZodError> {
    let synth_fee = registry.synth_info.liq_fee as i64;
    let quote_fee = registry.collaterals[quote_index].liq_fee as i64;
    let den = PERMIL - quote_fee;
    if den <= 0 {
        return Err(ZodError::Arithmetic);
    }
    Ok((PERMIL + synth_fee, den))
}

/// Net liquidation factor in permil: the margin relief per repaid unit
/// after accounting for the collateral leaving at a bonus.
fn net_liq_factor(registry: &Registry, quote_index: usize) -> Result<Fixed, ZodError> {
    let weight = registry.collaterals[quote_index].weight as i64;
    let (num, den) = fee_ratio(registry, quote_index)?;
    Fixed::from_int(weight)
        .mul_div_int(num, den)?
        .checked_sub(Fixed::from_int(PERMIL))
}

/// Repay up to `requested` of `liqee`'s debt from `liqor`'s balance in
/// exchange for `quote_mint` collateral plus the liquidation bonus.
#[allow(clippy::too_many_arguments)]
pub fn process_liquidate(
    liqee: &mut Margin,
    liqor: &mut Margin,
    registry: &mut Registry,
    cache: &Cache,
    quote_mint: &Pubkey,
    requested: u64,
    now: u64,
    price_source: PriceSource,
) -> Result<LiquidationResult, ZodError> {
    if requested == 0 {
        return Err(ZodError::InvalidAmount);
    }
    let quote_index = registry
        .collateral_index(quote_mint)
        .ok_or(ZodError::CollateralNotFound)?;

    let soc = registry.soc_loss_multiplier;
    let liqee_balance = liqee.actual_minted(soc)?;
    if !liqee_balance.is_positive() {
        return Err(ZodError::NotLiquidatable);
    }

    let omf = liqee.omf(registry, cache, now, price_source)?;
    let mmf = liqee.mmf(registry)?;
    if omf >= mmf {
        return Err(ZodError::NotLiquidatable);
    }

    let imf = liqee.imf(registry)?;
    let max_assets =
        liqee.max_reducible(registry, net_liq_factor(registry, quote_index)?, imf, omf)?;

    let liqor_balance = liqor.actual_minted(soc)?;
    if !liqor_balance.is_positive() {
        return Err(ZodError::InsufficientBalance);
    }

    let mut assets = max_assets
        .min(liqee_balance)
        .min(liqor_balance)
        .min(Fixed::from_u64(requested));
    if !assets.is_positive() {
        return Err(ZodError::NotLiquidatable);
    }

    let quote = &registry.collaterals[quote_index];
    let quote_price = cache.resolve_price(&quote.oracle_symbol, now, price_source)?;
    // synthetic is valued at one smol USD; convert to quote units
    let asset_quote_price = Fixed::ONE.checked_div(quote_price)?;
    let (fee_num, fee_den) = fee_ratio(registry, quote_index)?;

    let pre_fee_quote = assets.checked_mul(asset_quote_price)?.floor();
    let mut seized = pre_fee_quote.mul_div_int(fee_num, fee_den)?.floor();

    // the target can pay out at most what it holds; shrink the repayment
    // proportionally when its collateral runs short
    let rates = &cache.rates[quote_index];
    let available = liqee
        .actual_collateral(quote_index, rates.supply_multiplier, rates.borrow_multiplier)?
        .floor();
    if seized > available {
        seized = available;
        assets = available
            .checked_mul(quote_price)?
            .mul_div_int(fee_den, fee_num)?;
        if !assets.is_positive() {
            return Err(ZodError::NotLiquidatable);
        }
    }

    let repaid = assets.checked_neg()?;
    let mut staged_liqee = *liqee;
    let mut staged_liqor = *liqor;
    staged_liqee.mutate_minted(repaid, soc)?;
    staged_liqee.mutate_collateral(
        quote_index,
        seized.checked_neg()?,
        rates.supply_multiplier,
        rates.borrow_multiplier,
    )?;
    staged_liqor.mutate_minted(repaid, soc)?;
    staged_liqor.mutate_collateral(
        quote_index,
        seized,
        rates.supply_multiplier,
        rates.borrow_multiplier,
    )?;
    // both the written-off debt and the liquidator's burned tokens leave the
    // supply
    registry.mutate_total_minted(repaid.checked_mul(Fixed::from_int(2))?)?;

    *liqee = staged_liqee;
    *liqor = staged_liqor;
    Ok(LiquidationResult {
        assets_repaid: assets,
        collateral_seized: seized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SYNTH_LIQ_FEE, SYNTH_WEIGHT};
    use crate::state::CollateralInfo;
    use zod_common::Symbol;

    const NOW: u64 = 1_000;
    const USDC: Pubkey = [1; 32];

    fn setup(usdc_price: Fixed) -> (Registry, Cache) {
        let synth = CollateralInfo {
            mint: Pubkey::from([9; 32]),
            oracle_symbol: Symbol::new("ZOD"),
            decimals: 6,
            _padding: 0,
            weight: SYNTH_WEIGHT,
            liq_fee: SYNTH_LIQ_FEE,
            _padding2: [0; 2],
        };
        let mut registry = Registry::new(Pubkey::from([7; 32]), synth);
        registry
            .add_vault(
                Pubkey::from([2; 32]),
                CollateralInfo {
                    mint: USDC,
                    oracle_symbol: Symbol::new("USDC"),
                    decimals: 6,
                    _padding: 0,
                    weight: 1000,
                    liq_fee: 20,
                    _padding2: [0; 2],
                },
            )
            .unwrap();

        let mut cache = Cache::new();
        cache.set_oracle(Symbol::new("USDC"), usdc_price, NOW);
        (registry, cache)
    }

    fn account(deposit: i64, minted: i64, registry: &mut Registry) -> Margin {
        let mut margin = Margin::new(Pubkey::default());
        margin
            .mutate_collateral(0, Fixed::from_int(deposit), Fixed::ONE, Fixed::ONE)
            .unwrap();
        if minted > 0 {
            margin
                .mutate_minted(Fixed::from_int(minted), registry.soc_loss_multiplier)
                .unwrap();
            registry
                .mutate_total_minted(Fixed::from_int(minted))
                .unwrap();
        }
        margin
    }

    #[test]
    fn test_healthy_account_not_liquidatable() {
        let (mut registry, cache) = setup(Fixed::ONE);
        let mut liqee = account(10_000_000, 8_000_000, &mut registry);
        let mut liqor = account(50_000_000, 5_000_000, &mut registry);

        // at price 1.0: omf = 2e9, mmf = 144 * 8e6 = 1.152e9, omf >= mmf
        assert_eq!(
            process_liquidate(
                &mut liqee,
                &mut liqor,
                &mut registry,
                &cache,
                &USDC,
                1_000_000,
                NOW,
                PriceSource::Oracle,
            ),
            Err(ZodError::NotLiquidatable)
        );
    }

    #[test]
    fn test_partial_liquidation() {
        let (mut registry, cache) = setup(Fixed::from_ratio(9, 10).unwrap());
        let mut liqee = account(10_000_000, 8_000_000, &mut registry);
        let mut liqor = account(50_000_000, 5_000_000, &mut registry);

        // at price 0.9: omf = (9e6 - 8e6) * 1000 = 1e9 < mmf = 1.152e9
        let result = process_liquidate(
            &mut liqee,
            &mut liqor,
            &mut registry,
            &cache,
            &USDC,
            2_000_000,
            NOW,
            PriceSource::Oracle,
        )
        .unwrap();

        assert_eq!(result.assets_repaid, Fixed::from_int(2_000_000));
        // seized = floor(floor(2e6 / 0.9) * 1020/980)
        //        = floor(2,222,222 * 1020 / 980) = 2,312,924
        assert_eq!(result.collateral_seized, Fixed::from_int(2_312_924));

        assert_eq!(liqee.minted, Fixed::from_int(6_000_000));
        assert_eq!(liqor.minted, Fixed::from_int(3_000_000));
        assert_eq!(liqee.collateral[0], Fixed::from_int(10_000_000 - 2_312_924));
        assert_eq!(liqor.collateral[0], Fixed::from_int(50_000_000 + 2_312_924));
        // 13e6 total before, minus write-off and the liquidator's burn
        assert_eq!(registry.total_minted, Fixed::from_int(9_000_000));
    }

    #[test]
    fn test_repayment_capped_at_initial_margin() {
        let (mut registry, cache) = setup(Fixed::from_ratio(9, 10).unwrap());
        let mut liqee = account(10_000_000, 8_000_000, &mut registry);
        let mut liqor = account(500_000_000, 50_000_000, &mut registry);

        // ask for far more than max_reducible allows
        let result = process_liquidate(
            &mut liqee,
            &mut liqor,
            &mut registry,
            &cache,
            &USDC,
            50_000_000,
            NOW,
            PriceSource::Oracle,
        )
        .unwrap();

        // (imf - omf) / (base_imf - net_liq_factor) with imf = 1.776e9,
        // omf = 1e9, base_imf = 222, nlf = 2000/49: just over 4.28e6
        assert!(result.assets_repaid > Fixed::from_int(4_282_000));
        assert!(result.assets_repaid < Fixed::from_int(4_284_000));

        // the full cap lands the target on its initial margin, up to the
        // flooring of the seized collateral
        let omf = liqee
            .omf(&registry, &cache, NOW, PriceSource::Oracle)
            .unwrap();
        let imf = liqee.imf(&registry).unwrap();
        let gap = omf.checked_sub(imf).unwrap().abs().unwrap();
        assert!(gap < Fixed::from_int(10_000));
    }

    #[test]
    fn test_liquidator_needs_synthetic_balance() {
        let (mut registry, cache) = setup(Fixed::from_ratio(9, 10).unwrap());
        let mut liqee = account(10_000_000, 8_000_000, &mut registry);
        let mut liqor = account(50_000_000, 0, &mut registry);

        assert_eq!(
            process_liquidate(
                &mut liqee,
                &mut liqor,
                &mut registry,
                &cache,
                &USDC,
                1_000_000,
                NOW,
                PriceSource::Oracle,
            ),
            Err(ZodError::InsufficientBalance)
        );
    }

    #[test]
    fn test_seizure_capped_by_target_collateral() {
        let (mut registry, cache) = setup(Fixed::from_ratio(9, 10).unwrap());
        // deeply underwater: almost no collateral left against real debt
        let mut liqee = account(1_000_000, 8_000_000, &mut registry);
        let mut liqor = account(50_000_000, 8_000_000, &mut registry);

        let result = process_liquidate(
            &mut liqee,
            &mut liqor,
            &mut registry,
            &cache,
            &USDC,
            8_000_000,
            NOW,
            PriceSource::Oracle,
        )
        .unwrap();

        assert_eq!(result.collateral_seized, Fixed::from_int(1_000_000));
        assert_eq!(liqee.collateral[0], Fixed::ZERO);
        // repayment shrank proportionally, debt remains
        assert!(liqee.minted.is_positive());
        assert!(result.assets_repaid < Fixed::from_int(1_000_000));
    }
}
