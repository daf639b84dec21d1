//! Zod integration tests
//!
//! Scenario tests drive the instruction handlers directly against in-memory
//! account state; PDA tests check address derivation against the Solana SDK.
//! Full on-chain runs require the program compiled to a .so and a test
//! validator.

use zod_common::{Fixed, Symbol};
use zod_margin::{Cache, CollateralInfo, Margin, Registry};

pub const USDC_MINT: [u8; 32] = [1; 32];
pub const USDC_DECIMALS: u8 = 6;
pub const NOW: u64 = 1_700_000_000;

/// Registry with USDC listed and a synthetic configured the way deployment
/// does it.
pub fn test_registry(admin: [u8; 32]) -> Registry {
    let synth = CollateralInfo {
        mint: [9; 32],
        oracle_symbol: Symbol::new("ZOD"),
        decimals: 6,
        _padding: 0,
        weight: 900,
        liq_fee: 20,
        _padding2: [0; 2],
    };
    let mut registry = Registry::new(admin, synth);
    registry
        .add_vault(
            [2; 32],
            CollateralInfo {
                mint: USDC_MINT,
                oracle_symbol: Symbol::new("USDC"),
                decimals: USDC_DECIMALS,
                _padding: 0,
                weight: 1000,
                liq_fee: 20,
                _padding2: [0; 2],
            },
        )
        .expect("listing USDC");
    registry
}

/// Flat-rate cache with a one-dollar USDC oracle.
pub fn test_cache() -> Cache {
    let mut cache = Cache::new();
    cache.set_oracle(Symbol::new("USDC"), Fixed::ONE, NOW);
    cache
}

pub fn funded_margin(authority: [u8; 32], deposit: u64) -> Margin {
    let mut margin = Margin::new(authority);
    margin
        .mutate_collateral(0, Fixed::from_u64(deposit), Fixed::ONE, Fixed::ONE)
        .expect("seeding collateral");
    margin
}
