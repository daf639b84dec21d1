//! Collateral withdrawal, gated on projected margin

use crate::state::{Cache, Margin, Registry};
use pinocchio::pubkey::Pubkey;
use zod_common::{Fixed, PriceSource, ZodError};

/// Debit `amount` native units of `mint` from the margin account.
///
/// The mutation is staged on a stack copy and committed only after the
/// projected margin check passes, so a rejected withdrawal leaves the
/// account untouched.
pub fn process_withdraw(
    margin: &mut Margin,
    registry: &Registry,
    cache: &Cache,
    mint: &Pubkey,
    amount: u64,
    now: u64,
    price_source: PriceSource,
) -> Result<(), ZodError> {
    if amount == 0 {
        return Err(ZodError::InvalidAmount);
    }
    let index = registry
        .collateral_index(mint)
        .ok_or(ZodError::CollateralNotFound)?;
    let rates = &cache.rates[index];

    let requested = Fixed::from_u64(amount);
    let available =
        margin.actual_collateral(index, rates.supply_multiplier, rates.borrow_multiplier)?;
    if requested > available {
        return Err(ZodError::InsufficientBalance);
    }

    let mut staged = *margin;
    staged.mutate_collateral(
        index,
        requested.checked_neg()?,
        rates.supply_multiplier,
        rates.borrow_multiplier,
    )?;

    let omf = staged.omf(registry, cache, now, price_source)?;
    let imf = staged.imf(registry)?;
    if omf <= imf && !staged.minted.is_zero() {
        return Err(ZodError::InsufficientMargin);
    }

    *margin = staged;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SYNTH_LIQ_FEE, SYNTH_WEIGHT};
    use crate::state::CollateralInfo;
    use zod_common::Symbol;

    const NOW: u64 = 1_000;
    const USDC: Pubkey = [1; 32];

    fn setup() -> (Registry, Cache) {
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
        cache.set_oracle(Symbol::new("USDC"), Fixed::ONE, NOW);
        (registry, cache)
    }

    #[test]
    fn test_deposit_withdraw_round_trip() {
        let (registry, cache) = setup();
        let mut margin = Margin::new(Pubkey::default());
        margin
            .mutate_collateral(0, Fixed::from_int(40_000_000), Fixed::ONE, Fixed::ONE)
            .unwrap();

        process_withdraw(
            &mut margin,
            &registry,
            &cache,
            &USDC,
            35_000_000,
            NOW,
            PriceSource::Oracle,
        )
        .unwrap();
        assert_eq!(margin.collateral[0], Fixed::from_int(5_000_000));
    }

    #[test]
    fn test_withdraw_rejects_overdraw() {
        let (registry, cache) = setup();
        let mut margin = Margin::new(Pubkey::default());
        margin
            .mutate_collateral(0, Fixed::from_int(100), Fixed::ONE, Fixed::ONE)
            .unwrap();

        assert_eq!(
            process_withdraw(
                &mut margin,
                &registry,
                &cache,
                &USDC,
                101,
                NOW,
                PriceSource::Oracle,
            ),
            Err(ZodError::InsufficientBalance)
        );
        assert_eq!(margin.collateral[0], Fixed::from_int(100));
    }

    #[test]
    fn test_withdraw_gated_by_margin_when_minted() {
        let (registry, cache) = setup();
        let mut margin = Margin::new(Pubkey::default());
        margin
            .mutate_collateral(0, Fixed::from_int(20_000_000), Fixed::ONE, Fixed::ONE)
            .unwrap();
        margin
            .mutate_minted(Fixed::from_int(9_500_000), registry.soc_loss_multiplier)
            .unwrap();

        // pulling almost everything would leave omf below imf
        assert_eq!(
            process_withdraw(
                &mut margin,
                &registry,
                &cache,
                &USDC,
                10_000_000,
                NOW,
                PriceSource::Oracle,
            ),
            Err(ZodError::InsufficientMargin)
        );
        // the failed attempt must not have touched the ledger
        assert_eq!(margin.collateral[0], Fixed::from_int(20_000_000));

        process_withdraw(
            &mut margin,
            &registry,
            &cache,
            &USDC,
            1_000_000,
            NOW,
            PriceSource::Oracle,
        )
        .unwrap();
        assert_eq!(margin.collateral[0], Fixed::from_int(19_000_000));
    }
}
