//! Shared protocol types

use crate::fixed::Fixed;

/// Maximum number of registered collateral assets per deployment.
pub const MAX_COLLATERALS: usize = 25;

/// Oracle symbol, fixed-width ASCII, zero padded.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Symbol {
    pub data: [u8; 24],
}

impl Symbol {
    pub fn new(s: &str) -> Self {
        let mut data = [0u8; 24];
        let bytes = s.as_bytes();
        let len = bytes.len().min(24);
        data[..len].copy_from_slice(&bytes[..len]);
        Symbol { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data == [0u8; 24]
    }
}

/// Where an operation sources its collateral price.
///
/// `Override` exists so tests can make margin checks deterministic; the
/// program only honors it when built with the `devnet` feature and always
/// reads the oracle cache in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Oracle,
    Override(Fixed),
}
