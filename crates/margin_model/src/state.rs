//! Model state
//!
//! Amounts are i128 micro-units (1_000_000 = 1.0); weights, fees and margin
//! fractions are permil. One quote collateral asset stands in for the full
//! per-asset ledger, which is enough to exercise every margin rule.

use arrayvec::ArrayVec;

/// Micro-unit scale: multipliers, prices and the socialized-loss factor are
/// all expressed against this.
pub const SCALE: i128 = 1_000_000;
/// Permil scale for weights, fees and margin fractions.
pub const PERMIL: i128 = 1000;

pub const INITIAL_MARGIN_REQ: i128 = 1_100_000;
pub const MAINT_MARGIN_REQ: i128 = 1_030_000;

pub const MAX_ACCOUNTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    InvalidAmount,
    InsufficientBalance,
    InsufficientMargin,
    NotLiquidatable,
    NotBankrupt,
    AlreadySettled,
    Arithmetic,
    UnknownAccount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Account {
    /// Raw quote collateral, before multiplier application
    pub collateral: i128,
    /// Raw minted balance, before the socialized-loss factor
    pub minted: i128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Supply-side interest multiplier (micro)
    pub supply_multiplier: i128,
    /// Borrow-side interest multiplier (micro)
    pub borrow_multiplier: i128,
    /// Quote price in micro USD per unit
    pub price: i128,
    /// Quote collateral weight (permil)
    pub weight: i128,
    /// Quote liquidation fee (permil)
    pub quote_liq_fee: i128,
    /// Synthetic token liquidation fee (permil)
    pub synth_liq_fee: i128,
    /// Synthetic token weight (permil), drives base margin fractions
    pub synth_weight: i128,
    pub insurance: i128,
    /// Raw total minted supply
    pub total_minted: i128,
    /// Socialized-loss factor (micro), starts at SCALE, only grows
    pub soc_multiplier: i128,
    pub accounts: ArrayVec<Account, MAX_ACCOUNTS>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            supply_multiplier: SCALE,
            borrow_multiplier: SCALE,
            price: SCALE,
            weight: 1000,
            quote_liq_fee: 20,
            synth_liq_fee: 20,
            synth_weight: 900,
            insurance: 0,
            total_minted: 0,
            soc_multiplier: SCALE,
            accounts: ArrayVec::new(),
        }
    }
}

/// Floor division of `a * b / c`, rounding toward negative infinity so
/// negative balances never round in the holder's favor.
pub fn mul_div_floor(a: i128, b: i128, c: i128) -> Result<i128, ModelError> {
    if c == 0 {
        return Err(ModelError::Arithmetic);
    }
    let product = a.checked_mul(b).ok_or(ModelError::Arithmetic)?;
    let quotient = product.checked_div(c).ok_or(ModelError::Arithmetic)?;
    let remainder = product.checked_rem(c).ok_or(ModelError::Arithmetic)?;
    if remainder != 0 && (remainder < 0) != (c < 0) {
        quotient.checked_sub(1).ok_or(ModelError::Arithmetic)
    } else {
        Ok(quotient)
    }
}

impl State {
    pub fn account(&self, uid: usize) -> Result<&Account, ModelError> {
        self.accounts.get(uid).ok_or(ModelError::UnknownAccount)
    }

    /// Base initial margin fraction in permil.
    pub fn base_imf(&self) -> Result<i128, ModelError> {
        if self.synth_weight <= 0 {
            return Err(ModelError::Arithmetic);
        }
        Ok(INITIAL_MARGIN_REQ / self.synth_weight - PERMIL)
    }

    /// Base maintenance margin fraction in permil.
    pub fn base_mmf(&self) -> Result<i128, ModelError> {
        if self.synth_weight <= 0 {
            return Err(ModelError::Arithmetic);
        }
        Ok(MAINT_MARGIN_REQ / self.synth_weight - PERMIL)
    }

    /// Present collateral value: deposits accrue the supply multiplier,
    /// borrows the borrow multiplier.
    pub fn actual_collateral(&self, uid: usize) -> Result<i128, ModelError> {
        let raw = self.account(uid)?.collateral;
        let multiplier = if raw < 0 {
            self.borrow_multiplier
        } else {
            self.supply_multiplier
        };
        mul_div_floor(raw, multiplier, SCALE)
    }

    /// Minted balance after the socialized-loss factor.
    pub fn actual_minted(&self, uid: usize) -> Result<i128, ModelError> {
        mul_div_floor(self.account(uid)?.minted, self.soc_multiplier, SCALE)
    }

    pub fn actual_total_minted(&self) -> Result<i128, ModelError> {
        mul_div_floor(self.total_minted, self.soc_multiplier, SCALE)
    }

    /// Collateral value in micro USD, weight applied to non-negative
    /// positions only.
    pub fn collateral_value(&self, uid: usize, weighted: bool) -> Result<i128, ModelError> {
        let value = mul_div_floor(self.actual_collateral(uid)?, self.price, SCALE)?;
        if weighted && value >= 0 {
            mul_div_floor(value, self.weight, PERMIL)
        } else {
            Ok(value)
        }
    }

    /// Overall margin fraction: `(collateral_value - minted) * 1000`.
    pub fn omf(&self, uid: usize) -> Result<i128, ModelError> {
        let value = self.collateral_value(uid, true)?;
        value
            .checked_sub(self.actual_minted(uid)?)
            .and_then(|v| v.checked_mul(PERMIL))
            .ok_or(ModelError::Arithmetic)
    }

    pub fn imf(&self, uid: usize) -> Result<i128, ModelError> {
        self.base_imf()?
            .checked_mul(self.actual_minted(uid)?)
            .ok_or(ModelError::Arithmetic)
    }

    pub fn mmf(&self, uid: usize) -> Result<i128, ModelError> {
        self.base_mmf()?
            .checked_mul(self.actual_minted(uid)?)
            .ok_or(ModelError::Arithmetic)
    }

    /// Conservation check: raw total equals the sum of raw balances.
    pub fn conserves_total_minted(&self) -> bool {
        let sum: i128 = self.accounts.iter().map(|a| a.minted).sum();
        self.total_minted == sum
    }
}
