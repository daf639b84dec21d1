//! Error codes shared by the on-chain program and its callers

use pinocchio::program_error::ProgramError;

/// Protocol error codes, stable across releases (new variants append only).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZodError {
    /// Malformed or unknown instruction data
    InvalidInstruction = 0,
    /// Account set does not match the instruction's expectations
    InvalidAccount = 1,
    /// Signer is not the margin authority / registry admin
    Unauthorized = 2,
    /// Zero or out-of-range amount
    InvalidAmount = 3,
    /// Collateral or debt arithmetic would leave the allowed range
    InsufficientBalance = 4,
    /// Projected overall margin would not clear the initial requirement
    InsufficientMargin = 5,
    /// Target account is above the maintenance threshold
    NotLiquidatable = 6,
    /// Target account still holds collateral above the dust threshold
    NotBankrupt = 7,
    /// Target account's debt has already been written off
    AlreadySettled = 8,
    /// Oracle entry expired before the operation committed
    StaleOracle = 9,
    /// Fixed-point overflow or division by zero
    Arithmetic = 10,
    /// Mint is not a registered collateral asset
    CollateralNotFound = 11,
    /// Insurance fund cannot cover the requested reduction
    InsufficientInsurance = 12,
    /// Collateral asset is already registered
    VaultExists = 13,
    /// Registry has no room for another collateral asset
    RegistryFull = 14,
    /// Oracle symbol has no cache entry
    OracleNotFound = 15,
}

impl From<ZodError> for ProgramError {
    fn from(e: ZodError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl ZodError {
    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ZodError::InvalidInstruction => "InvalidInstruction",
            ZodError::InvalidAccount => "InvalidAccount",
            ZodError::Unauthorized => "Unauthorized",
            ZodError::InvalidAmount => "InvalidAmount",
            ZodError::InsufficientBalance => "InsufficientBalance",
            ZodError::InsufficientMargin => "InsufficientMargin",
            ZodError::NotLiquidatable => "NotLiquidatable",
            ZodError::NotBankrupt => "NotBankrupt",
            ZodError::AlreadySettled => "AlreadySettled",
            ZodError::StaleOracle => "StaleOracle",
            ZodError::Arithmetic => "Arithmetic",
            ZodError::CollateralNotFound => "CollateralNotFound",
            ZodError::InsufficientInsurance => "InsufficientInsurance",
            ZodError::VaultExists => "VaultExists",
            ZodError::RegistryFull => "RegistryFull",
            ZodError::OracleNotFound => "OracleNotFound",
        }
    }
}
