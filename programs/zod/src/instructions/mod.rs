//! Instruction handlers
//!
//! Account deserialization and validation happen in the entrypoint; the
//! `process_*` functions here operate on already-borrowed state so the
//! accounting logic stays testable off-chain. Handlers that must roll back
//! on a failed margin check mutate a stack copy first and commit only after
//! every check passes.

pub mod admin;
pub mod burn;
pub mod create_margin;
pub mod deposit;
pub mod init_state;
pub mod liquidate;
pub mod mint;
pub mod settle_bankruptcy;
pub mod withdraw;

pub use admin::*;
pub use burn::*;
pub use create_margin::*;
pub use deposit::*;
pub use init_state::*;
pub use liquidate::*;
pub use mint::*;
pub use settle_bankruptcy::*;
pub use withdraw::*;

/// Instruction discriminator.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZodInstruction {
    /// Initialize the protocol registry
    InitState = 0,
    /// Register a collateral asset and its vault
    AddVault = 1,
    /// Create a margin account for an authority
    CreateMargin = 2,
    /// Credit collateral to a margin account
    Deposit = 3,
    /// Debit collateral, gated on projected margin
    Withdraw = 4,
    /// Mint synthetic tokens against collateral
    Mint = 5,
    /// Burn synthetic tokens, reducing debt
    Burn = 6,
    /// Repay an under-margin account's debt for discounted collateral
    LiquidatePosition = 7,
    /// Grow the insurance fund (admin)
    AddInsurance = 8,
    /// Shrink the insurance fund (admin)
    ReduceInsurance = 9,
    /// Write off a bankrupt account's debt
    SettleBankruptcy = 10,
}

impl ZodInstruction {
    pub fn from_discriminator(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::InitState),
            1 => Some(Self::AddVault),
            2 => Some(Self::CreateMargin),
            3 => Some(Self::Deposit),
            4 => Some(Self::Withdraw),
            5 => Some(Self::Mint),
            6 => Some(Self::Burn),
            7 => Some(Self::LiquidatePosition),
            8 => Some(Self::AddInsurance),
            9 => Some(Self::ReduceInsurance),
            10 => Some(Self::SettleBankruptcy),
            _ => None,
        }
    }
}
