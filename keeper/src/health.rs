//! Margin account health assessment
//!
//! Reads raw account data fetched over RPC into the on-chain state types and
//! computes the same margin fractions the program checks, so the keeper only
//! submits liquidations that will pass the on-chain gate.

use solana_sdk::pubkey::Pubkey;
use zod_common::{Fixed, PriceSource, ZodError};
use zod_margin::{Cache, Margin, Registry};

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("account data too small: {got} bytes, expected {want}")]
    AccountTooSmall { got: usize, want: usize },
    #[error("margin valuation failed: {0:?}")]
    Valuation(ZodError),
}

impl From<ZodError> for HealthError {
    fn from(e: ZodError) -> Self {
        HealthError::Valuation(e)
    }
}

/// Health snapshot for one margin account.
#[derive(Debug, Clone)]
pub struct MarginHealth {
    /// Margin account address
    pub margin: Pubkey,
    /// Account authority
    pub authority: Pubkey,
    /// `omf - mmf`; negative means the account is liquidatable
    pub health: Fixed,
    /// Outstanding debt after the socialized-loss haircut
    pub minted: Fixed,
    /// Debt remains but no collateral worth seizing does; the account needs
    /// settlement rather than liquidation
    pub bankrupt: bool,
    /// Unix timestamp of the assessment
    pub last_update: u64,
}

impl MarginHealth {
    /// True when the on-chain liquidation gate (`omf < mmf`, debt
    /// outstanding) would pass.
    pub fn needs_liquidation(&self) -> bool {
        !self.minted.is_zero() && self.health.is_negative() && !self.bankrupt
    }
}

fn read_account<T>(data: &[u8], want: usize) -> Result<T, HealthError> {
    if data.len() < want {
        return Err(HealthError::AccountTooSmall {
            got: data.len(),
            want,
        });
    }
    // Sound for the #[repr(C)] state structs: every bit pattern is a valid
    // value and read_unaligned tolerates RPC buffers without alignment.
    Ok(unsafe { std::ptr::read_unaligned(data.as_ptr() as *const T) })
}

pub fn parse_margin(data: &[u8]) -> Result<Margin, HealthError> {
    read_account(data, Margin::LEN)
}

pub fn parse_registry(data: &[u8]) -> Result<Registry, HealthError> {
    read_account(data, Registry::LEN)
}

pub fn parse_cache(data: &[u8]) -> Result<Cache, HealthError> {
    read_account(data, Cache::LEN)
}

/// Assess one margin account against current registry and cache state.
pub fn assess(
    margin_key: Pubkey,
    margin: &Margin,
    registry: &Registry,
    cache: &Cache,
    now: u64,
) -> Result<MarginHealth, HealthError> {
    let omf = margin.omf(registry, cache, now, PriceSource::Oracle)?;
    let mmf = margin.mmf(registry)?;
    let minted = margin.actual_minted(registry.soc_loss_multiplier)?;
    let bankrupt = !minted.is_zero()
        && margin.has_no_collateral_above_dust(registry, cache, now, PriceSource::Oracle)?;

    Ok(MarginHealth {
        margin: margin_key,
        authority: Pubkey::new_from_array(margin.authority),
        health: omf.checked_sub(mmf)?,
        minted,
        bankrupt,
        last_update: now,
    })
}

/// Health in whole smol-USD-permil units, for logging.
pub fn display_health(health: Fixed) -> i64 {
    health.floor_i64().unwrap_or(i64::MIN)
}
