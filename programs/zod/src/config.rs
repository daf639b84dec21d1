//! Protocol parameters
//!
//! Margin requirements are permil-of-weight figures: dividing by an asset
//! weight (permil) and subtracting 1000 yields the asset's base margin
//! fraction in permil. Example: 1_100_000 / 900 - 1000 = 222 permil initial
//! margin for a weight-900 asset.

/// Spot initial margin requirement (permil * permil scale).
pub const SPOT_INITIAL_MARGIN_REQ: u32 = 1_100_000;

/// Spot maintenance margin requirement. Strictly below the initial
/// requirement so accounts pass through an under-margin band before they
/// become liquidatable.
pub const SPOT_MAINT_MARGIN_REQ: u32 = 1_030_000;

/// Permil scale used by weights, fees and margin fractions.
pub const PERMIL: i64 = 1000;

/// Collateral below this value (smol USD) is treated as zero when deciding
/// bankruptcy eligibility.
pub const DUST_THRESHOLD: i64 = 10_000;

/// Oracle entries older than this many seconds fail margin checks.
pub const ORACLE_STALENESS_SECS: u64 = 60;

/// Default risk parameters of the synthetic token.
pub const SYNTH_DECIMALS: u8 = 6;
pub const SYNTH_WEIGHT: u16 = 900;
pub const SYNTH_LIQ_FEE: u16 = 20;
pub const SYNTH_SYMBOL: &str = "ZOD";
