//! End-to-end accounting scenarios
//!
//! Each test walks a full user journey through the instruction handlers:
//! funding, minting, price moves (via the devnet override), liquidation and
//! settlement.

use zod_common::{Fixed, PriceSource, ZodError};
use zod_integration_tests::{funded_margin, test_cache, test_registry, NOW, USDC_MINT};
use zod_margin::{
    process_add_insurance, process_burn, process_deposit, process_liquidate, process_mint,
    process_settle_bankruptcy, process_withdraw, Margin,
};

const ALICE: [u8; 32] = [10; 32];
const BOB: [u8; 32] = [11; 32];
const ADMIN: [u8; 32] = [7; 32];

const USDC: u64 = 1_000_000;

#[tokio::test]
async fn test_deposit_then_withdraw_leaves_remainder() {
    let registry = test_registry(ADMIN);
    let cache = test_cache();
    let mut alice = Margin::new(ALICE);

    process_deposit(&mut alice, &registry, &cache, &USDC_MINT, 40 * USDC).unwrap();
    process_withdraw(
        &mut alice,
        &registry,
        &cache,
        &USDC_MINT,
        35 * USDC,
        NOW,
        PriceSource::Oracle,
    )
    .unwrap();

    assert_eq!(alice.collateral[0], Fixed::from_u64(5 * USDC));
}

#[tokio::test]
async fn test_mint_and_burn_nets_out() {
    let mut registry = test_registry(ADMIN);
    let cache = test_cache();
    let mut alice = funded_margin(ALICE, 40 * USDC);

    process_mint(
        &mut alice,
        &mut registry,
        &cache,
        9_500_000,
        NOW,
        PriceSource::Oracle,
    )
    .unwrap();
    process_burn(&mut alice, &mut registry, 9_000_000).unwrap();

    assert_eq!(alice.minted, Fixed::from_int(500_000));
    assert_eq!(registry.total_minted, Fixed::from_int(500_000));
}

#[tokio::test]
async fn test_minting_past_margin_fails() {
    let mut registry = test_registry(ADMIN);
    let cache = test_cache();
    let mut alice = funded_margin(ALICE, 40 * USDC);

    process_mint(
        &mut alice,
        &mut registry,
        &cache,
        9_500_000,
        NOW,
        PriceSource::Oracle,
    )
    .unwrap();

    // the remaining capacity is well under 25 more units
    assert_eq!(
        process_mint(
            &mut alice,
            &mut registry,
            &cache,
            25 * USDC,
            NOW,
            PriceSource::Oracle,
        ),
        Err(ZodError::InsufficientMargin)
    );
    // rejected mint left balances alone
    assert_eq!(alice.minted, Fixed::from_int(9_500_000));
    assert_eq!(registry.total_minted, Fixed::from_int(9_500_000));
}

#[tokio::test]
async fn test_liquidation_after_price_drop() {
    let mut registry = test_registry(ADMIN);
    let cache = test_cache();
    let mut alice = funded_margin(ALICE, 10 * USDC);
    let mut bob = funded_margin(BOB, 100 * USDC);

    process_mint(
        &mut alice,
        &mut registry,
        &cache,
        8 * USDC,
        NOW,
        PriceSource::Oracle,
    )
    .unwrap();
    process_mint(
        &mut bob,
        &mut registry,
        &cache,
        20 * USDC,
        NOW,
        PriceSource::Oracle,
    )
    .unwrap();

    // healthy at a dollar
    assert_eq!(
        process_liquidate(
            &mut alice,
            &mut bob,
            &mut registry,
            &cache,
            &USDC_MINT,
            USDC,
            NOW,
            PriceSource::Oracle,
        ),
        Err(ZodError::NotLiquidatable)
    );

    // USDC marks down to 90 cents
    let crashed = PriceSource::Override(Fixed::from_ratio(9, 10).unwrap());
    let result = process_liquidate(
        &mut alice,
        &mut bob,
        &mut registry,
        &cache,
        &USDC_MINT,
        2 * USDC,
        NOW,
        crashed,
    )
    .unwrap();

    assert_eq!(result.assets_repaid, Fixed::from_int(2_000_000));
    assert_eq!(alice.minted, Fixed::from_int(6_000_000));
    // seized = floor(floor(2e6 / 0.9) * 1020/980) = 2,312,924
    assert_eq!(result.collateral_seized, Fixed::from_int(2_312_924));
    assert_eq!(
        bob.collateral[0],
        Fixed::from_int(100_000_000 + 2_312_924)
    );
}

#[tokio::test]
async fn test_bankruptcy_settlement_drains_insurance_then_socializes() {
    let mut registry = test_registry(ADMIN);
    let cache = test_cache();
    process_add_insurance(&mut registry, &ADMIN, 3 * USDC).unwrap();

    // alice's collateral is gone, debt remains; bob holds enough synthetic
    // to retire it, and third parties keep 10 units outstanding
    let mut alice = Margin::new(ALICE);
    alice
        .mutate_minted(Fixed::from_int(5_000_000), Fixed::ONE)
        .unwrap();
    let mut bob = funded_margin(BOB, 100 * USDC);
    bob.mutate_minted(Fixed::from_int(5_000_000), Fixed::ONE)
        .unwrap();
    registry
        .mutate_total_minted(Fixed::from_int(20_000_000))
        .unwrap();

    let result = process_settle_bankruptcy(
        &mut alice,
        &mut bob,
        &mut registry,
        &cache,
        NOW,
        PriceSource::Oracle,
    )
    .unwrap();

    // compensation = 5e6 * 1020/1000 = 5.1e6; the 3e6 fund drains and the
    // residual 2.1e6 spreads over the surviving 10e6 units
    assert_eq!(result.insurance_drawn, 3_000_000);
    assert_eq!(registry.insurance, 0);
    assert_eq!(alice.minted, Fixed::ZERO);
    assert_eq!(bob.minted, Fixed::ZERO);
    assert_eq!(
        registry.soc_loss_multiplier,
        Fixed::ONE
            .checked_add(Fixed::from_ratio(21, 100).unwrap())
            .unwrap()
    );

    // settling again cannot double-draw
    assert_eq!(
        process_settle_bankruptcy(
            &mut alice,
            &mut bob,
            &mut registry,
            &cache,
            NOW,
            PriceSource::Oracle,
        ),
        Err(ZodError::AlreadySettled)
    );
    assert_eq!(registry.insurance, 0);
}

#[tokio::test]
async fn test_settlement_rejected_while_collateral_remains() {
    let mut registry = test_registry(ADMIN);
    let cache = test_cache();
    process_add_insurance(&mut registry, &ADMIN, 10 * USDC).unwrap();

    let mut alice = funded_margin(ALICE, USDC);
    alice
        .mutate_minted(Fixed::from_int(5_000_000), Fixed::ONE)
        .unwrap();
    let mut bob = funded_margin(BOB, 100 * USDC);
    bob.mutate_minted(Fixed::from_int(8_000_000), Fixed::ONE)
        .unwrap();
    registry
        .mutate_total_minted(Fixed::from_int(13_000_000))
        .unwrap();

    assert_eq!(
        process_settle_bankruptcy(
            &mut alice,
            &mut bob,
            &mut registry,
            &cache,
            NOW,
            PriceSource::Oracle,
        ),
        Err(ZodError::NotBankrupt)
    );
}
