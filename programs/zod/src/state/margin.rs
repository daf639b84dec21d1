//! Margin account: per-authority collateral ledger and minted balance
//!
//! Collateral is stored in raw units, divided out by the interest multiplier
//! that was current at mutation time. Re-multiplying by the current
//! multiplier yields the present value, so interest accrues without the
//! account ever being touched. The minted balance works the same way
//! against the registry's socialized-loss multiplier.

use crate::config::{DUST_THRESHOLD, PERMIL};
use crate::state::{Cache, Registry};
use pinocchio::pubkey::Pubkey;
use zod_common::{Fixed, PriceSource, ZodError, MAX_COLLATERALS};

/// Margin account.
/// PDA: [authority, registry_key, "zodmarginv2"]
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Margin {
    pub nonce: u8,
    pub _padding: [u8; 7],
    pub authority: Pubkey,
    /// Token account receiving minted synthetic tokens; bound at creation,
    /// immutable afterwards.
    pub token_account: Pubkey,
    /// Raw collateral per registered asset, before multiplier application.
    /// Negative entries are borrow positions.
    pub collateral: [Fixed; MAX_COLLATERALS],
    /// Raw minted balance, before the socialized-loss multiplier
    pub minted: Fixed,
}

impl Margin {
    pub const LEN: usize = core::mem::size_of::<Self>();

    pub fn initialize_in_place(&mut self, authority: Pubkey, token_account: Pubkey, nonce: u8) {
        self.nonce = nonce;
        self._padding = [0; 7];
        self.authority = authority;
        self.token_account = token_account;
        self.collateral = [Fixed::ZERO; MAX_COLLATERALS];
        self.minted = Fixed::ZERO;
    }

    /// Host-side constructor for tests and tooling.
    #[cfg(not(target_os = "solana"))]
    pub fn new(authority: Pubkey) -> Self {
        Self {
            nonce: 0,
            _padding: [0; 7],
            authority,
            token_account: Pubkey::default(),
            collateral: [Fixed::ZERO; MAX_COLLATERALS],
            minted: Fixed::ZERO,
        }
    }

    /// Present value of one collateral entry: deposits accrue the supply
    /// multiplier, borrows the borrow multiplier.
    pub fn actual_collateral(
        &self,
        index: usize,
        supply_multiplier: Fixed,
        borrow_multiplier: Fixed,
    ) -> Result<Fixed, ZodError> {
        let raw = self.collateral[index];
        let multiplier = if raw.is_negative() {
            borrow_multiplier
        } else {
            supply_multiplier
        };
        raw.checked_mul(multiplier)
    }

    /// Apply `amount` (in present-value units) to a collateral entry and
    /// store the result back in raw units under the side-appropriate
    /// multiplier.
    pub fn mutate_collateral(
        &mut self,
        index: usize,
        amount: Fixed,
        supply_multiplier: Fixed,
        borrow_multiplier: Fixed,
    ) -> Result<(), ZodError> {
        let actual = self.actual_collateral(index, supply_multiplier, borrow_multiplier)?;
        let adjusted = actual.checked_add(amount)?;
        let multiplier = if adjusted.is_negative() {
            borrow_multiplier
        } else {
            supply_multiplier
        };
        self.collateral[index] = adjusted.checked_div(multiplier)?;
        Ok(())
    }

    /// Minted balance after the socialized-loss multiplier.
    pub fn actual_minted(&self, soc_loss_multiplier: Fixed) -> Result<Fixed, ZodError> {
        self.minted.checked_mul(soc_loss_multiplier)
    }

    /// Apply `amount` (haircut-adjusted units) to the minted balance. The
    /// balance can never go negative.
    pub fn mutate_minted(
        &mut self,
        amount: Fixed,
        soc_loss_multiplier: Fixed,
    ) -> Result<(), ZodError> {
        let actual = self.actual_minted(soc_loss_multiplier)?;
        let adjusted = actual.checked_add(amount)?;
        if adjusted.is_negative() {
            return Err(ZodError::InsufficientBalance);
        }
        self.minted = adjusted.checked_div(soc_loss_multiplier)?;
        Ok(())
    }

    /// Zero the minted balance as part of a bankruptcy write-off.
    pub fn write_off(&mut self) {
        self.minted = Fixed::ZERO;
    }

    /// Sum of present collateral values in smol USD, per-asset price applied
    /// after multiplier scaling. When `weighted` is set, non-negative
    /// positions are discounted by the asset weight; borrow positions always
    /// count at full price.
    pub fn total_collateral_value(
        &self,
        registry: &Registry,
        cache: &Cache,
        weighted: bool,
        now: u64,
        price_source: PriceSource,
    ) -> Result<Fixed, ZodError> {
        let mut sum = Fixed::ZERO;
        let max_col = (registry.collateral_count as usize).min(MAX_COLLATERALS);

        for (i, raw) in self.collateral[..max_col].iter().enumerate() {
            let info = &registry.collaterals[i];
            if raw.is_zero() || info.is_empty() {
                continue;
            }

            let rates = &cache.rates[i];
            let value =
                self.actual_collateral(i, rates.supply_multiplier, rates.borrow_multiplier)?;
            let price = cache.resolve_price(&info.oracle_symbol, now, price_source)?;

            let mut contribution = price.checked_mul(value)?;
            if weighted && !value.is_negative() {
                // integer permil scaling keeps the weight exact; a
                // premultiplied ratio would shave bits off every valuation
                contribution = contribution.mul_div_int(info.weight as i64, PERMIL)?;
            }

            sum = sum.checked_add(contribution)?;
        }

        Ok(sum)
    }

    /// Overall margin fraction in permil-value units:
    /// `(collateral_value - minted_balance) * 1000`.
    pub fn omf(
        &self,
        registry: &Registry,
        cache: &Cache,
        now: u64,
        price_source: PriceSource,
    ) -> Result<Fixed, ZodError> {
        let collateral_value =
            self.total_collateral_value(registry, cache, true, now, price_source)?;
        let minted = self.actual_minted(registry.soc_loss_multiplier)?;
        collateral_value
            .checked_sub(minted)?
            .checked_mul(Fixed::from_int(PERMIL))
    }

    /// Initial margin requirement in the same units as [`Margin::omf`].
    pub fn imf(&self, registry: &Registry) -> Result<Fixed, ZodError> {
        let minted = self.actual_minted(registry.soc_loss_multiplier)?;
        registry.synth_info.base_imf()?.checked_mul(minted)
    }

    /// Maintenance margin requirement; crossing below this makes the account
    /// liquidatable.
    pub fn mmf(&self, registry: &Registry) -> Result<Fixed, ZodError> {
        let minted = self.actual_minted(registry.soc_loss_multiplier)?;
        registry.synth_info.base_mmf()?.checked_mul(minted)
    }

    /// Maximum debt a liquidator may repay to bring this account back to its
    /// initial margin:
    ///
    /// every repaid unit raises omf by the fee drag and lowers imf by the
    /// synthetic's base imf, so the transfer that closes the gap is
    /// `(imf - omf) / (base_imf - net_liq_factor)`.
    pub fn max_reducible(
        &self,
        registry: &Registry,
        net_liq_factor: Fixed,
        imf: Fixed,
        omf: Fixed,
    ) -> Result<Fixed, ZodError> {
        let base_imf = registry.synth_info.base_imf()?;
        if base_imf <= net_liq_factor {
            return Err(ZodError::Arithmetic);
        }
        imf.checked_sub(omf)?
            .checked_div(base_imf.checked_sub(net_liq_factor)?)
    }

    /// True when no collateral entry values above the dust threshold, i.e.
    /// there is nothing left worth liquidating.
    pub fn has_no_collateral_above_dust(
        &self,
        registry: &Registry,
        cache: &Cache,
        now: u64,
        price_source: PriceSource,
    ) -> Result<bool, ZodError> {
        let max_col = (registry.collateral_count as usize).min(MAX_COLLATERALS);

        for (i, raw) in self.collateral[..max_col].iter().enumerate() {
            let info = &registry.collaterals[i];
            if raw.is_zero() || info.is_empty() {
                continue;
            }

            let rates = &cache.rates[i];
            let value =
                self.actual_collateral(i, rates.supply_multiplier, rates.borrow_multiplier)?;
            let price = cache.resolve_price(&info.oracle_symbol, now, price_source)?;
            let smol = price.checked_mul(value)?.floor_i64()?;
            if smol > DUST_THRESHOLD {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
