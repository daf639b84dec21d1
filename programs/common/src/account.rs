//! Account validation and zero-copy borrow helpers

use crate::error::ZodError;
use pinocchio::{account_info::AccountInfo, pubkey::Pubkey};

/// Require the account to be owned by `program_id`.
#[inline]
pub fn validate_owner(account: &AccountInfo, program_id: &Pubkey) -> Result<(), ZodError> {
    if !account.is_owned_by(program_id) {
        return Err(ZodError::InvalidAccount);
    }
    Ok(())
}

/// Require the account to be writable.
#[inline]
pub fn validate_writable(account: &AccountInfo) -> Result<(), ZodError> {
    if !account.is_writable() {
        return Err(ZodError::InvalidAccount);
    }
    Ok(())
}

/// Require the account to have signed the transaction.
#[inline]
pub fn validate_signer(account: &AccountInfo) -> Result<(), ZodError> {
    if !account.is_signer() {
        return Err(ZodError::Unauthorized);
    }
    Ok(())
}

/// Borrow account data as a `#[repr(C)]` state struct.
///
/// # Safety
///
/// Caller must ensure no other live borrow of the same account data exists
/// for the duration of the returned reference, and that `T` tolerates any
/// bit pattern in the account.
pub unsafe fn borrow_account_data<T>(account: &AccountInfo) -> Result<&T, ZodError> {
    let data = account.borrow_data_unchecked();
    if data.len() < core::mem::size_of::<T>() {
        return Err(ZodError::InvalidAccount);
    }
    Ok(&*(data.as_ptr() as *const T))
}

/// Mutable variant of [`borrow_account_data`].
///
/// # Safety
///
/// Same requirements as [`borrow_account_data`], plus exclusivity of the
/// mutable borrow.
pub unsafe fn borrow_account_data_mut<T>(account: &AccountInfo) -> Result<&mut T, ZodError> {
    let data = account.borrow_mut_data_unchecked();
    if data.len() < core::mem::size_of::<T>() {
        return Err(ZodError::InvalidAccount);
    }
    Ok(&mut *(data.as_mut_ptr() as *mut T))
}
