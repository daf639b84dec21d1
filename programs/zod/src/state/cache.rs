//! Read-only mirror of the lending protocol's cache account
//!
//! The cache is owned and advanced by the external lending protocol: an
//! interest process grows the supply/borrow multipliers and an oracle keeper
//! refreshes prices. This program only ever reads it, snapshotting whatever
//! values it holds at the start of an operation.

use crate::config::ORACLE_STALENESS_SECS;
use zod_common::{Fixed, PriceSource, Symbol, ZodError, MAX_COLLATERALS};

/// Per-asset interest multipliers. Both only ever grow: the supply
/// multiplier accrues yield to depositors, the borrow multiplier accrues
/// interest owed.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RateEntry {
    pub supply_multiplier: Fixed,
    pub borrow_multiplier: Fixed,
}

impl RateEntry {
    pub fn flat() -> Self {
        Self {
            supply_multiplier: Fixed::ONE,
            borrow_multiplier: Fixed::ONE,
        }
    }
}

/// Oracle price entry (smol USD per native unit).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OracleEntry {
    pub symbol: Symbol,
    pub price: Fixed,
    pub last_updated: u64,
}

impl OracleEntry {
    pub fn is_stale(&self, now: u64) -> bool {
        now.saturating_sub(self.last_updated) > ORACLE_STALENESS_SECS
    }
}

/// Lending protocol cache account.
/// PDA (foreign program): ["cache", lending_state]
#[repr(C)]
pub struct Cache {
    pub nonce: u8,
    pub _padding: [u8; 5],
    pub oracle_count: u16,
    pub rates: [RateEntry; MAX_COLLATERALS],
    pub oracles: [OracleEntry; MAX_COLLATERALS],
}

impl Cache {
    pub const LEN: usize = core::mem::size_of::<Self>();

    /// Flat-multiplier cache for host-side tests and tooling.
    /// Excluded from BPF builds to avoid stack overflow.
    #[cfg(not(target_os = "solana"))]
    pub fn new() -> Self {
        Self {
            nonce: 0,
            _padding: [0; 5],
            oracle_count: 0,
            rates: [RateEntry::flat(); MAX_COLLATERALS],
            oracles: [OracleEntry {
                symbol: Symbol::default(),
                price: Fixed::ZERO,
                last_updated: 0,
            }; MAX_COLLATERALS],
        }
    }

    #[cfg(not(target_os = "solana"))]
    pub fn set_oracle(&mut self, symbol: Symbol, price: Fixed, now: u64) {
        for entry in self.oracles[..self.oracle_count as usize].iter_mut() {
            if entry.symbol == symbol {
                entry.price = price;
                entry.last_updated = now;
                return;
            }
        }
        let idx = self.oracle_count as usize;
        self.oracles[idx] = OracleEntry {
            symbol,
            price,
            last_updated: now,
        };
        self.oracle_count += 1;
    }

    pub fn get_oracle(&self, symbol: &Symbol) -> Result<&OracleEntry, ZodError> {
        self.oracles[..(self.oracle_count as usize).min(MAX_COLLATERALS)]
            .iter()
            .find(|entry| &entry.symbol == symbol)
            .ok_or(ZodError::OracleNotFound)
    }

    /// Price for `symbol` under the given source, checked for staleness.
    ///
    /// Override prices are only honored on `devnet` builds; production
    /// builds read the oracle regardless of the caller's request.
    pub fn resolve_price(
        &self,
        symbol: &Symbol,
        now: u64,
        source: PriceSource,
    ) -> Result<Fixed, ZodError> {
        #[cfg(feature = "devnet")]
        if let PriceSource::Override(price) = source {
            return Ok(price);
        }
        #[cfg(not(feature = "devnet"))]
        let _ = source;

        let entry = self.get_oracle(symbol)?;
        if entry.is_stale(now) {
            return Err(ZodError::StaleOracle);
        }
        Ok(entry.price)
    }
}
