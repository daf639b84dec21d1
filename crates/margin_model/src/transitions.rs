//! State transitions - all total, no panics
//!
//! Every transition takes the state by value and returns either the updated
//! state or the error the engine would raise; a returned error implies the
//! input state was the final state (no partial application).

use crate::state::*;

/// Collateral value below this (micro USD) counts as dust for bankruptcy
/// eligibility.
pub const DUST_THRESHOLD: i128 = 10_000;

fn store_collateral(s: &mut State, uid: usize, actual: i128) -> Result<(), ModelError> {
    let multiplier = if actual < 0 {
        s.borrow_multiplier
    } else {
        s.supply_multiplier
    };
    s.accounts[uid].collateral = mul_div_floor(actual, SCALE, multiplier)?;
    Ok(())
}

/// Store a minted balance from adjusted units, mirroring the raw delta into
/// the total so conservation holds exactly.
fn store_minted(s: &mut State, uid: usize, actual: i128) -> Result<(), ModelError> {
    if actual < 0 {
        return Err(ModelError::InsufficientBalance);
    }
    let raw = mul_div_floor(actual, SCALE, s.soc_multiplier)?;
    let delta = raw
        .checked_sub(s.accounts[uid].minted)
        .ok_or(ModelError::Arithmetic)?;
    s.accounts[uid].minted = raw;
    s.total_minted = s
        .total_minted
        .checked_add(delta)
        .ok_or(ModelError::Arithmetic)?;
    Ok(())
}

pub fn deposit(mut s: State, uid: usize, amount: i128) -> Result<State, ModelError> {
    if amount <= 0 {
        return Err(ModelError::InvalidAmount);
    }
    let actual = checked_add(s.actual_collateral(uid)?, amount)?;
    store_collateral(&mut s, uid, actual)?;
    Ok(s)
}

pub fn withdraw(mut s: State, uid: usize, amount: i128) -> Result<State, ModelError> {
    if amount <= 0 {
        return Err(ModelError::InvalidAmount);
    }
    let available = s.actual_collateral(uid)?;
    if amount > available {
        return Err(ModelError::InsufficientBalance);
    }

    let staged = {
        let mut staged = s.clone();
        store_collateral(&mut staged, uid, available - amount)?;
        staged
    };
    if staged.accounts[uid].minted != 0 && staged.omf(uid)? <= staged.imf(uid)? {
        return Err(ModelError::InsufficientMargin);
    }
    s = staged;
    Ok(s)
}

pub fn mint(mut s: State, uid: usize, amount: i128) -> Result<State, ModelError> {
    if amount <= 0 {
        return Err(ModelError::InvalidAmount);
    }
    let staged = {
        let mut staged = s.clone();
        let actual = checked_add(staged.actual_minted(uid)?, amount)?;
        store_minted(&mut staged, uid, actual)?;
        staged
    };
    if staged.omf(uid)? <= staged.imf(uid)? {
        return Err(ModelError::InsufficientMargin);
    }
    s = staged;
    Ok(s)
}

pub fn burn(mut s: State, uid: usize, amount: i128) -> Result<State, ModelError> {
    if amount <= 0 {
        return Err(ModelError::InvalidAmount);
    }
    let balance = s.actual_minted(uid)?;
    if amount > balance {
        return Err(ModelError::InvalidAmount);
    }
    store_minted(&mut s, uid, balance - amount)?;
    Ok(s)
}

/// Liquidation fee numerator/denominator: the bonus compounds the
/// synthetic's fee with the quote asset's fee.
fn fee_ratio(s: &State) -> Result<(i128, i128), ModelError> {
    let num = PERMIL + s.synth_liq_fee;
    let den = PERMIL - s.quote_liq_fee;
    if den <= 0 {
        return Err(ModelError::Arithmetic);
    }
    Ok((num, den))
}

pub fn liquidate(
    mut s: State,
    liqee: usize,
    liqor: usize,
    requested: i128,
) -> Result<State, ModelError> {
    if requested <= 0 {
        return Err(ModelError::InvalidAmount);
    }
    if liqee == liqor {
        return Err(ModelError::UnknownAccount);
    }

    let liqee_balance = s.actual_minted(liqee)?;
    if liqee_balance <= 0 {
        return Err(ModelError::NotLiquidatable);
    }
    let omf = s.omf(liqee)?;
    if omf >= s.mmf(liqee)? {
        return Err(ModelError::NotLiquidatable);
    }
    let liqor_balance = s.actual_minted(liqor)?;
    if liqor_balance <= 0 {
        return Err(ModelError::InsufficientBalance);
    }

    // max repayment closing the gap to initial margin:
    // (imf - omf) / (base_imf - net_liq_factor), kept integral by scaling
    // through the fee denominator
    let (num, den) = fee_ratio(&s)?;
    let imf = s.imf(liqee)?;
    let relief = checked_sub(
        checked_mul(den, checked_add(s.base_imf()?, PERMIL)?)?,
        checked_mul(s.weight, num)?,
    )?;
    if relief <= 0 {
        return Err(ModelError::Arithmetic);
    }
    let max_repay = mul_div_floor(checked_sub(imf, omf)?, den, relief)?;

    let mut repay = requested
        .min(max_repay)
        .min(liqee_balance)
        .min(liqor_balance);
    if repay <= 0 {
        return Err(ModelError::NotLiquidatable);
    }

    let pre_fee = mul_div_floor(repay, SCALE, s.price)?;
    let mut seized = mul_div_floor(pre_fee, num, den)?;

    let available = s.actual_collateral(liqee)?;
    if seized > available {
        seized = available;
        repay = mul_div_floor(mul_div_floor(seized, s.price, SCALE)?, den, num)?;
        if repay <= 0 {
            return Err(ModelError::NotLiquidatable);
        }
    }

    store_minted(&mut s, liqee, liqee_balance - repay)?;
    store_minted(&mut s, liqor, liqor_balance - repay)?;
    store_collateral(&mut s, liqee, available - seized)?;
    let liqor_collateral = s.actual_collateral(liqor)?;
    store_collateral(&mut s, liqor, checked_add(liqor_collateral, seized)?)?;
    Ok(s)
}

pub fn settle_bankruptcy(mut s: State, liqee: usize, liqor: usize) -> Result<State, ModelError> {
    if liqee == liqor {
        return Err(ModelError::UnknownAccount);
    }
    if s.collateral_value(liqee, false)? > DUST_THRESHOLD {
        return Err(ModelError::NotBankrupt);
    }

    let debt = s.actual_minted(liqee)?;
    if debt == 0 {
        return Err(ModelError::AlreadySettled);
    }
    let liqor_balance = s.actual_minted(liqor)?;
    if liqor_balance < debt {
        return Err(ModelError::InsufficientBalance);
    }

    let compensation = mul_div_floor(debt, PERMIL + s.quote_liq_fee, PERMIL)?;

    store_minted(&mut s, liqee, 0)?;
    store_minted(&mut s, liqor, liqor_balance - debt)?;
    let liqor_collateral = s.actual_collateral(liqor)?;
    store_collateral(&mut s, liqor, checked_add(liqor_collateral, compensation)?)?;

    let drawn = compensation.min(s.insurance);
    s.insurance -= drawn;

    let residual = compensation - drawn;
    if residual > 0 {
        let base = s.actual_total_minted()?;
        if base <= 0 || residual >= base {
            return Err(ModelError::Arithmetic);
        }
        let growth = checked_add(SCALE, mul_div_floor(residual, SCALE, base)?)?;
        s.soc_multiplier = mul_div_floor(s.soc_multiplier, growth, SCALE)?;
    }
    Ok(s)
}

fn checked_add(a: i128, b: i128) -> Result<i128, ModelError> {
    a.checked_add(b).ok_or(ModelError::Arithmetic)
}

fn checked_sub(a: i128, b: i128) -> Result<i128, ModelError> {
    a.checked_sub(b).ok_or(ModelError::Arithmetic)
}

fn checked_mul(a: i128, b: i128) -> Result<i128, ModelError> {
    a.checked_mul(b).ok_or(ModelError::Arithmetic)
}
