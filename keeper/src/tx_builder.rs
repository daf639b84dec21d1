//! Transaction builder for liquidations and bankruptcy settlements

use anyhow::Result;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::Transaction,
};

const LIQUIDATE_POSITION: u8 = 7;
const SETTLE_BANKRUPTCY: u8 = 10;

/// Build a LiquidatePosition instruction.
///
/// Repays up to `max_repay` of the target's debt from the keeper's own
/// margin account and seizes quote collateral plus the liquidation bonus.
#[allow(clippy::too_many_arguments)]
pub fn build_liquidate_instruction(
    program_id: &Pubkey,
    liqee_margin: &Pubkey,
    liqor_margin: &Pubkey,
    registry: &Pubkey,
    cache: &Pubkey,
    keeper: &Pubkey,
    quote_mint: &Pubkey,
    max_repay: u64,
) -> Instruction {
    // discriminator + quote mint + amount + no price override
    let mut data = vec![LIQUIDATE_POSITION];
    data.extend_from_slice(quote_mint.as_ref());
    data.extend_from_slice(&max_repay.to_le_bytes());
    data.push(0);

    let accounts = vec![
        AccountMeta::new(*liqee_margin, false),
        AccountMeta::new(*liqor_margin, false),
        AccountMeta::new(*registry, false),
        AccountMeta::new_readonly(*cache, false),
        AccountMeta::new_readonly(*keeper, true),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Build a SettleBankruptcy instruction.
///
/// Retires a stripped account's debt against the keeper's margin balance;
/// the insurance fund compensates and any residual is socialized.
pub fn build_settle_instruction(
    program_id: &Pubkey,
    liqee_margin: &Pubkey,
    liqor_margin: &Pubkey,
    registry: &Pubkey,
    cache: &Pubkey,
    keeper: &Pubkey,
) -> Instruction {
    // discriminator + no price override
    let data = vec![SETTLE_BANKRUPTCY, 0];

    let accounts = vec![
        AccountMeta::new(*liqee_margin, false),
        AccountMeta::new(*liqor_margin, false),
        AccountMeta::new(*registry, false),
        AccountMeta::new_readonly(*cache, false),
        AccountMeta::new_readonly(*keeper, true),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Sign a single-instruction transaction with the keeper wallet.
pub fn build_keeper_transaction(
    instruction: Instruction,
    keeper: &Keypair,
    recent_blockhash: solana_sdk::hash::Hash,
) -> Result<Transaction> {
    let transaction = Transaction::new_signed_with_payer(
        &[instruction],
        Some(&keeper.pubkey()),
        &[keeper],
        recent_blockhash,
    );

    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_liquidate_instruction() {
        let program_id = Pubkey::new_unique();
        let liqee = Pubkey::new_unique();
        let liqor = Pubkey::new_unique();
        let registry = Pubkey::new_unique();
        let cache = Pubkey::new_unique();
        let keeper = Pubkey::new_unique();
        let quote_mint = Pubkey::new_unique();

        let ix = build_liquidate_instruction(
            &program_id,
            &liqee,
            &liqor,
            &registry,
            &cache,
            &keeper,
            &quote_mint,
            2_000_000,
        );

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.data[0], LIQUIDATE_POSITION);
        assert_eq!(&ix.data[1..33], quote_mint.as_ref());
        assert_eq!(ix.data[33..41], 2_000_000u64.to_le_bytes());
        // no price override
        assert_eq!(ix.data[41], 0);
        assert_eq!(ix.data.len(), 42);

        assert_eq!(ix.accounts.len(), 5);
        assert!(ix.accounts[0].is_writable);
        assert!(ix.accounts[1].is_writable);
        assert!(ix.accounts[2].is_writable);
        assert!(!ix.accounts[3].is_writable);
        assert!(ix.accounts[4].is_signer);
        assert_eq!(ix.accounts[4].pubkey, keeper);
    }

    #[test]
    fn test_build_settle_instruction() {
        let program_id = Pubkey::new_unique();
        let liqee = Pubkey::new_unique();
        let liqor = Pubkey::new_unique();
        let registry = Pubkey::new_unique();
        let cache = Pubkey::new_unique();
        let keeper = Pubkey::new_unique();

        let ix = build_settle_instruction(
            &program_id,
            &liqee,
            &liqor,
            &registry,
            &cache,
            &keeper,
        );

        assert_eq!(ix.data, vec![SETTLE_BANKRUPTCY, 0]);
        assert_eq!(ix.accounts.len(), 5);
        assert_eq!(ix.accounts[0].pubkey, liqee);
        assert_eq!(ix.accounts[1].pubkey, liqor);
        assert!(ix.accounts[4].is_signer);
    }
}
