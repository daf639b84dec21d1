//! Address derivation checks against the Solana SDK
//!
//! Clients derive every protocol address off-chain; these tests pin the
//! seed layouts so a client and the program can never disagree.

use solana_sdk::pubkey::Pubkey;
use zod_margin::pda::{MARGIN_SEED, REGISTRY_SEED, VAULT_SEED};

fn program_id() -> Pubkey {
    Pubkey::new_from_array(zod_margin::ID)
}

#[test]
fn test_registry_pda_is_deterministic() {
    let (a, bump_a) = Pubkey::find_program_address(&[REGISTRY_SEED], &program_id());
    let (b, bump_b) = Pubkey::find_program_address(&[REGISTRY_SEED], &program_id());
    assert_eq!(a, b);
    assert_eq!(bump_a, bump_b);
    assert!(!a.is_on_curve());
}

#[test]
fn test_margin_pda_binds_authority_and_registry() {
    let (registry, _) = Pubkey::find_program_address(&[REGISTRY_SEED], &program_id());
    let alice = Pubkey::new_unique();
    let bob = Pubkey::new_unique();

    let margin = |authority: &Pubkey| {
        Pubkey::find_program_address(
            &[authority.as_ref(), registry.as_ref(), MARGIN_SEED],
            &program_id(),
        )
        .0
    };

    assert_eq!(margin(&alice), margin(&alice));
    assert_ne!(margin(&alice), margin(&bob));
}

#[test]
fn test_vault_pda_binds_mint() {
    let (registry, _) = Pubkey::find_program_address(&[REGISTRY_SEED], &program_id());
    let usdc = Pubkey::new_unique();
    let wbtc = Pubkey::new_unique();

    let vault = |mint: &Pubkey| {
        Pubkey::find_program_address(
            &[VAULT_SEED, registry.as_ref(), mint.as_ref()],
            &program_id(),
        )
        .0
    };

    assert_ne!(vault(&usdc), vault(&wbtc));
}
