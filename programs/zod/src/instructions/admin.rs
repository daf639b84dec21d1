//! Insurance fund administration

use crate::state::Registry;
use pinocchio::pubkey::Pubkey;
use zod_common::ZodError;

/// Grow the insurance fund by `amount` smol USD. Admin only.
pub fn process_add_insurance(
    registry: &mut Registry,
    caller: &Pubkey,
    amount: u64,
) -> Result<(), ZodError> {
    if caller != &registry.admin {
        return Err(ZodError::Unauthorized);
    }
    let delta = i64::try_from(amount).map_err(|_| ZodError::InvalidAmount)?;
    if delta == 0 {
        return Err(ZodError::InvalidAmount);
    }
    registry.mutate_insurance(delta)
}

/// Draw `amount` smol USD out of the insurance fund. Admin only; fails when
/// the fund cannot cover the draw.
pub fn process_reduce_insurance(
    registry: &mut Registry,
    caller: &Pubkey,
    amount: u64,
) -> Result<(), ZodError> {
    if caller != &registry.admin {
        return Err(ZodError::Unauthorized);
    }
    let delta = i64::try_from(amount).map_err(|_| ZodError::InvalidAmount)?;
    if delta == 0 {
        return Err(ZodError::InvalidAmount);
    }
    registry.mutate_insurance(-delta)
}
