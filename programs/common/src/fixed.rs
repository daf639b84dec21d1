//! Signed fixed-point arithmetic for balances, multipliers and margin ratios
//!
//! `Fixed` wraps an `i128` scaled by 2^48 (80 integer bits, 48 fractional
//! bits). The raw bit pattern is what gets persisted in account data, so
//! `from_bits`/`to_bits` round-trip losslessly.
//!
//! All arithmetic is checked: multiplication goes through a 256-bit limb
//! product, division long-divides the shifted numerator at the same width,
//! so the full i128 bit range is usable. Nothing here saturates or wraps
//! silently.

use crate::error::ZodError;

/// Number of fractional bits.
pub const FRAC_BITS: u32 = 48;

const ONE_BITS: i128 = 1i128 << FRAC_BITS;
const LO_MASK: u128 = (1u128 << 64) - 1;

/// Fixed-point value, 80.48 layout over `i128`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fixed(i128);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(ONE_BITS);

    /// Reconstruct from a persisted bit pattern.
    #[inline]
    pub const fn from_bits(bits: i128) -> Self {
        Fixed(bits)
    }

    /// Raw bit pattern for persistence.
    #[inline]
    pub const fn to_bits(self) -> i128 {
        self.0
    }

    #[inline]
    pub const fn from_int(v: i64) -> Self {
        // i64 << 48 always fits in i128
        Fixed((v as i128) << FRAC_BITS)
    }

    #[inline]
    pub const fn from_u64(v: u64) -> Self {
        Fixed((v as i128) << FRAC_BITS)
    }

    /// `num / den` as a fixed-point value. Truncates toward zero.
    pub fn from_ratio(num: i64, den: i64) -> Result<Self, ZodError> {
        if den == 0 {
            return Err(ZodError::Arithmetic);
        }
        Ok(Fixed(((num as i128) << FRAC_BITS) / den as i128))
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn abs(self) -> Result<Self, ZodError> {
        self.0.checked_abs().map(Fixed).ok_or(ZodError::Arithmetic)
    }

    pub fn checked_neg(self) -> Result<Self, ZodError> {
        self.0.checked_neg().map(Fixed).ok_or(ZodError::Arithmetic)
    }

    pub fn checked_add(self, rhs: Fixed) -> Result<Self, ZodError> {
        self.0
            .checked_add(rhs.0)
            .map(Fixed)
            .ok_or(ZodError::Arithmetic)
    }

    pub fn checked_sub(self, rhs: Fixed) -> Result<Self, ZodError> {
        self.0
            .checked_sub(rhs.0)
            .map(Fixed)
            .ok_or(ZodError::Arithmetic)
    }

    /// Full-width multiply: 128x128 limb product, then shift the 256-bit
    /// result right by `FRAC_BITS`.
    pub fn checked_mul(self, rhs: Fixed) -> Result<Self, ZodError> {
        let negative = (self.0 < 0) != (rhs.0 < 0);
        let (hi, lo) = mul_wide(self.0.unsigned_abs(), rhs.0.unsigned_abs());
        if hi >> FRAC_BITS != 0 {
            return Err(ZodError::Arithmetic);
        }
        let mag = (hi << (128 - FRAC_BITS)) | (lo >> FRAC_BITS);
        apply_sign(mag, negative)
    }

    /// `(self << 48) / rhs`. The shifted numerator is carried at 256 bits
    /// and long-divided, so any representable value can be divided; fails
    /// when the divisor is zero or the quotient overflows. Truncates toward
    /// zero.
    pub fn checked_div(self, rhs: Fixed) -> Result<Self, ZodError> {
        if rhs.0 == 0 {
            return Err(ZodError::Arithmetic);
        }
        let negative = (self.0 < 0) != (rhs.0 < 0);
        let a = self.0.unsigned_abs();
        let hi = a >> (128 - FRAC_BITS);
        let lo = a << FRAC_BITS;
        let mag = div_wide(hi, lo, rhs.0.unsigned_abs())?;
        apply_sign(mag, negative)
    }

    /// `self * num / den` with the product carried at 256 bits and a single
    /// truncation at the end. Permil weights and fee ratios go through this
    /// so they stay exact instead of losing bits to a premultiplied
    /// fraction.
    pub fn mul_div_int(self, num: i64, den: i64) -> Result<Self, ZodError> {
        if den == 0 {
            return Err(ZodError::Arithmetic);
        }
        let negative = ((self.0 < 0) != (num < 0)) != (den < 0);
        let (hi, lo) = mul_wide(self.0.unsigned_abs(), num.unsigned_abs() as u128);
        let mag = div_wide(hi, lo, den.unsigned_abs() as u128)?;
        apply_sign(mag, negative)
    }

    /// Truncate toward negative infinity. Valuation is always `mul` then
    /// `floor`: on supply-side conversions the truncation never rounds in the
    /// depositor's favor, and borrow-side debt is never understated by more
    /// than one raw unit against the protocol.
    #[inline]
    pub const fn floor(self) -> Self {
        // Arithmetic shift floors for negative values.
        Fixed((self.0 >> FRAC_BITS) << FRAC_BITS)
    }

    pub fn floor_i64(self) -> Result<i64, ZodError> {
        let v = self.0 >> FRAC_BITS;
        if v < i64::MIN as i128 || v > i64::MAX as i128 {
            return Err(ZodError::Arithmetic);
        }
        Ok(v as i64)
    }

    pub fn floor_u64(self) -> Result<u64, ZodError> {
        let v = self.0 >> FRAC_BITS;
        if v < 0 || v > u64::MAX as i128 {
            return Err(ZodError::Arithmetic);
        }
        Ok(v as u64)
    }

    #[inline]
    pub fn min(self, rhs: Fixed) -> Fixed {
        if self.0 < rhs.0 {
            self
        } else {
            rhs
        }
    }

    #[inline]
    pub fn max(self, rhs: Fixed) -> Fixed {
        if self.0 > rhs.0 {
            self
        } else {
            rhs
        }
    }
}

#[inline]
fn apply_sign(mag: u128, negative: bool) -> Result<Fixed, ZodError> {
    if mag > i128::MAX as u128 {
        return Err(ZodError::Arithmetic);
    }
    let v = mag as i128;
    Ok(Fixed(if negative { -v } else { v }))
}

/// 128x128 -> 256 multiply via 64-bit limbs. Returns (hi, lo).
fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let a_lo = a & LO_MASK;
    let a_hi = a >> 64;
    let b_lo = b & LO_MASK;
    let b_hi = b >> 64;

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & LO_MASK) + (hl & LO_MASK);
    let lo = (mid << 64) | (ll & LO_MASK);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// 256 / 128 -> 128 restoring long division. Fails when the quotient does
/// not fit in 128 bits (`hi >= d`).
fn div_wide(hi: u128, lo: u128, d: u128) -> Result<u128, ZodError> {
    if d == 0 || hi >= d {
        return Err(ZodError::Arithmetic);
    }
    let mut rem = hi;
    let mut quot: u128 = 0;
    for i in (0..128).rev() {
        // the true remainder is 129 bits wide here; the shifted-out top bit
        // guarantees rem >= d, so the wrapping subtraction stays correct
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quot <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quot |= 1;
        }
    }
    Ok(quot)
}
