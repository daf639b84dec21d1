//! Protocol registry: collateral listing, insurance fund, minted-supply
//! accounting and the socialized-loss multiplier

use crate::config::{PERMIL, SPOT_INITIAL_MARGIN_REQ, SPOT_MAINT_MARGIN_REQ};
use pinocchio::pubkey::Pubkey;
use zod_common::{Fixed, Symbol, ZodError, MAX_COLLATERALS};

/// Registered collateral asset.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CollateralInfo {
    pub mint: Pubkey,
    pub oracle_symbol: Symbol,
    pub decimals: u8,
    pub _padding: u8,
    /// Collateral weight in permil (1000 = full value)
    pub weight: u16,
    /// Liquidation fee in permil
    pub liq_fee: u16,
    pub _padding2: [u8; 2],
}

impl CollateralInfo {
    pub fn is_empty(&self) -> bool {
        self.mint == Pubkey::default()
    }

    pub const fn zeroed() -> Self {
        Self {
            mint: [0; 32],
            oracle_symbol: Symbol { data: [0; 24] },
            decimals: 0,
            _padding: 0,
            weight: 0,
            liq_fee: 0,
            _padding2: [0; 2],
        }
    }

    /// Base initial margin fraction in permil:
    /// `SPOT_INITIAL_MARGIN_REQ / weight - 1000`.
    pub fn base_imf(&self) -> Result<Fixed, ZodError> {
        base_fraction(SPOT_INITIAL_MARGIN_REQ, self.weight)
    }

    /// Base maintenance margin fraction in permil. Always below
    /// [`CollateralInfo::base_imf`].
    pub fn base_mmf(&self) -> Result<Fixed, ZodError> {
        base_fraction(SPOT_MAINT_MARGIN_REQ, self.weight)
    }
}

fn base_fraction(requirement: u32, weight: u16) -> Result<Fixed, ZodError> {
    if weight == 0 {
        return Err(ZodError::Arithmetic);
    }
    Fixed::from_ratio(requirement as i64, weight as i64)?
        .floor()
        .checked_sub(Fixed::from_int(PERMIL))
}

/// Registry account, one per deployment.
/// PDA: ["zodv12"]
#[repr(C)]
pub struct Registry {
    pub state_nonce: u8,
    pub lending_margin_nonce: u8,
    pub _padding: [u8; 4],
    pub collateral_count: u16,
    pub admin: Pubkey,
    /// External lending protocol's state account
    pub lending_state: Pubkey,
    /// The lending protocol's cache account (multipliers and oracle prices)
    pub lending_cache: Pubkey,
    /// This program's margin account inside the lending protocol
    pub lending_margin: Pubkey,
    /// Insurance fund balance in smol USD
    pub insurance: u64,
    pub collaterals: [CollateralInfo; MAX_COLLATERALS],
    pub vaults: [Pubkey; MAX_COLLATERALS],
    /// Mint of the synthetic token
    pub synth_mint: Pubkey,
    /// Risk parameters of the synthetic token
    pub synth_info: CollateralInfo,
    /// Scales every outstanding minted balance once insurance is exhausted,
    /// spreading residual deficits across remaining minters. Starts at 1 and
    /// only ever grows.
    pub soc_loss_multiplier: Fixed,
    /// Total minted supply in raw units (before the socialized-loss haircut)
    pub total_minted: Fixed,
}

impl Registry {
    pub const LEN: usize = core::mem::size_of::<Self>();

    /// Initialize registry in-place (avoids a multi-KB stack temporary,
    /// which would exceed BPF's 4KB frame limit).
    #[allow(clippy::too_many_arguments)]
    pub fn initialize_in_place(
        &mut self,
        admin: Pubkey,
        lending_state: Pubkey,
        lending_cache: Pubkey,
        lending_margin: Pubkey,
        synth_mint: Pubkey,
        synth_info: CollateralInfo,
        state_nonce: u8,
        lending_margin_nonce: u8,
    ) {
        self.state_nonce = state_nonce;
        self.lending_margin_nonce = lending_margin_nonce;
        self._padding = [0; 4];
        self.collateral_count = 0;
        self.admin = admin;
        self.lending_state = lending_state;
        self.lending_cache = lending_cache;
        self.lending_margin = lending_margin;
        self.insurance = 0;
        unsafe {
            core::ptr::write_bytes(self.collaterals.as_mut_ptr(), 0, MAX_COLLATERALS);
            core::ptr::write_bytes(self.vaults.as_mut_ptr(), 0, MAX_COLLATERALS);
        }
        self.synth_mint = synth_mint;
        self.synth_info = synth_info;
        self.soc_loss_multiplier = Fixed::ONE;
        self.total_minted = Fixed::ZERO;
    }

    /// Host-side constructor for tests and tooling.
    /// Excluded from BPF builds to avoid stack overflow.
    #[cfg(not(target_os = "solana"))]
    pub fn new(admin: Pubkey, synth_info: CollateralInfo) -> Self {
        Self {
            state_nonce: 0,
            lending_margin_nonce: 0,
            _padding: [0; 4],
            collateral_count: 0,
            admin,
            lending_state: Pubkey::default(),
            lending_cache: Pubkey::default(),
            lending_margin: Pubkey::default(),
            insurance: 0,
            collaterals: [CollateralInfo::zeroed(); MAX_COLLATERALS],
            vaults: [Pubkey::default(); MAX_COLLATERALS],
            synth_mint: Pubkey::default(),
            synth_info,
            soc_loss_multiplier: Fixed::ONE,
            total_minted: Fixed::ZERO,
        }
    }

    /// Register a collateral asset and its vault. Rejects duplicates.
    pub fn add_vault(
        &mut self,
        vault: Pubkey,
        info: CollateralInfo,
    ) -> Result<u16, ZodError> {
        if info.weight == 0 || info.weight as i64 > PERMIL {
            return Err(ZodError::InvalidAmount);
        }
        if self.collateral_index(&info.mint).is_some() {
            return Err(ZodError::VaultExists);
        }
        let idx = self
            .collaterals
            .iter()
            .position(|c| c.is_empty())
            .ok_or(ZodError::RegistryFull)?;

        self.collaterals[idx] = info;
        self.vaults[idx] = vault;
        if idx as u16 >= self.collateral_count {
            self.collateral_count = idx as u16 + 1;
        }
        Ok(idx as u16)
    }

    pub fn collateral_index(&self, mint: &Pubkey) -> Option<usize> {
        self.collaterals[..(self.collateral_count as usize).min(MAX_COLLATERALS)]
            .iter()
            .position(|c| !c.is_empty() && &c.mint == mint)
    }

    /// Adjust the insurance fund. Negative deltas draw it down and fail when
    /// the fund cannot cover them.
    pub fn mutate_insurance(&mut self, delta: i64) -> Result<(), ZodError> {
        let current = self.insurance as i64;
        if current.checked_add(delta).is_none() || current + delta < 0 {
            return Err(ZodError::InsufficientInsurance);
        }
        self.insurance = (current + delta) as u64;
        Ok(())
    }

    /// Total minted supply after the socialized-loss haircut.
    pub fn actual_total_minted(&self) -> Result<Fixed, ZodError> {
        self.total_minted.checked_mul(self.soc_loss_multiplier)
    }

    /// Adjust the total minted supply by `amount` (in haircut-adjusted
    /// units), clamping at zero, and store back in raw units so the
    /// invariant `total_minted == Σ margin.minted` survives multiplier
    /// changes.
    pub fn mutate_total_minted(&mut self, amount: Fixed) -> Result<(), ZodError> {
        let actual = self.actual_total_minted()?;
        let floor = actual.checked_neg()?;
        let adjusted = actual.checked_add(amount.max(floor))?;
        self.total_minted = adjusted.checked_div(self.soc_loss_multiplier)?;
        Ok(())
    }

    /// Grow the socialized-loss multiplier by `loss_per_minted` (a fraction
    /// strictly below one): every outstanding minted balance is scaled up
    /// uniformly on next valuation.
    pub fn socialize_loss(&mut self, loss_per_minted: Fixed) -> Result<(), ZodError> {
        if loss_per_minted >= Fixed::ONE || loss_per_minted.is_negative() {
            return Err(ZodError::Arithmetic);
        }
        self.soc_loss_multiplier = Fixed::ONE
            .checked_add(loss_per_minted)?
            .checked_mul(self.soc_loss_multiplier)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SYNTH_LIQ_FEE, SYNTH_WEIGHT};

    fn synth_info() -> CollateralInfo {
        CollateralInfo {
            mint: Pubkey::from([9; 32]),
            oracle_symbol: Symbol::new("ZOD"),
            decimals: 6,
            _padding: 0,
            weight: SYNTH_WEIGHT,
            liq_fee: SYNTH_LIQ_FEE,
            _padding2: [0; 2],
        }
    }

    fn usdc_info() -> CollateralInfo {
        CollateralInfo {
            mint: Pubkey::from([1; 32]),
            oracle_symbol: Symbol::new("USDC"),
            decimals: 6,
            _padding: 0,
            weight: 1000,
            liq_fee: 20,
            _padding2: [0; 2],
        }
    }

    #[test]
    fn test_add_vault_and_lookup() {
        let mut registry = Registry::new(Pubkey::from([7; 32]), synth_info());

        let idx = registry
            .add_vault(Pubkey::from([2; 32]), usdc_info())
            .unwrap();
        assert_eq!(idx, 0);
        assert_eq!(registry.collateral_count, 1);
        assert_eq!(registry.collateral_index(&Pubkey::from([1; 32])), Some(0));
        assert_eq!(registry.collateral_index(&Pubkey::from([3; 32])), None);
    }

    #[test]
    fn test_add_vault_rejects_duplicate() {
        let mut registry = Registry::new(Pubkey::default(), synth_info());
        registry
            .add_vault(Pubkey::from([2; 32]), usdc_info())
            .unwrap();
        assert_eq!(
            registry.add_vault(Pubkey::from([4; 32]), usdc_info()),
            Err(ZodError::VaultExists)
        );
    }

    #[test]
    fn test_add_vault_rejects_bad_weight() {
        let mut registry = Registry::new(Pubkey::default(), synth_info());
        let mut info = usdc_info();
        info.weight = 0;
        assert_eq!(
            registry.add_vault(Pubkey::default(), info),
            Err(ZodError::InvalidAmount)
        );
    }

    #[test]
    fn test_base_fractions() {
        // 1_100_000 / 900 = 1222 (floored), minus 1000 = 222 permil
        let imf = synth_info().base_imf().unwrap();
        assert_eq!(imf, Fixed::from_int(222));
        // 1_030_000 / 900 = 1144, minus 1000 = 144 permil
        let mmf = synth_info().base_mmf().unwrap();
        assert_eq!(mmf, Fixed::from_int(144));
        assert!(mmf < imf);
    }

    #[test]
    fn test_insurance_fund() {
        let mut registry = Registry::new(Pubkey::default(), synth_info());
        registry.mutate_insurance(5_000_000).unwrap();
        assert_eq!(registry.insurance, 5_000_000);
        registry.mutate_insurance(-2_000_000).unwrap();
        assert_eq!(registry.insurance, 3_000_000);
        assert_eq!(
            registry.mutate_insurance(-3_000_001),
            Err(ZodError::InsufficientInsurance)
        );
        assert_eq!(registry.insurance, 3_000_000);
    }

    #[test]
    fn test_total_minted_tracks_haircut() {
        let mut registry = Registry::new(Pubkey::default(), synth_info());
        registry
            .mutate_total_minted(Fixed::from_int(10_000_000))
            .unwrap();
        assert_eq!(
            registry.actual_total_minted().unwrap(),
            Fixed::from_int(10_000_000)
        );

        // 10% socialized loss: every outstanding balance is scaled up, so
        // the adjusted supply grows while the raw store is untouched
        registry
            .socialize_loss(Fixed::from_ratio(1, 10).unwrap())
            .unwrap();
        let actual = registry.actual_total_minted().unwrap();
        let diff = actual
            .checked_sub(Fixed::from_int(11_000_000))
            .unwrap()
            .abs()
            .unwrap();
        assert!(diff < Fixed::from_ratio(1, 1000).unwrap());
        assert_eq!(registry.total_minted, Fixed::from_int(10_000_000));

        // burn everything; clamped at zero even if over-burned
        registry
            .mutate_total_minted(Fixed::from_int(-20_000_000))
            .unwrap();
        assert_eq!(registry.actual_total_minted().unwrap(), Fixed::ZERO);
    }

    #[test]
    fn test_socialize_loss_bounds() {
        let mut registry = Registry::new(Pubkey::default(), synth_info());
        assert_eq!(
            registry.socialize_loss(Fixed::ONE),
            Err(ZodError::Arithmetic)
        );
        assert_eq!(
            registry.socialize_loss(Fixed::from_int(-1)),
            Err(ZodError::Arithmetic)
        );
        registry
            .socialize_loss(Fixed::from_ratio(21, 100).unwrap())
            .unwrap();
        assert_eq!(
            registry.soc_loss_multiplier,
            Fixed::from_ratio(121, 100).unwrap()
        );
    }
}
