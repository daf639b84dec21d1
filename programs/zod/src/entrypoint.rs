//! Program entrypoint
//!
//! Parses the discriminator, validates the account set, borrows the state
//! accounts and hands off to the instruction handlers. The cache account is
//! owned by the external lending protocol, so it is checked by size and key
//! rather than by owner.

use pinocchio::{
    account_info::AccountInfo,
    entrypoint, msg,
    pubkey::Pubkey,
    sysvars::{clock::Clock, Sysvar},
    ProgramResult,
};
use pinocchio_log::log;

use crate::instructions::{
    process_add_insurance, process_add_vault, process_burn, process_create_margin,
    process_deposit, process_init_state, process_liquidate, process_mint,
    process_reduce_insurance, process_settle_bankruptcy, process_withdraw, ZodInstruction,
};
use crate::pda::derive_margin_pda;
use crate::state::{Cache, CollateralInfo, Margin, Registry};
use zod_common::{
    borrow_account_data, borrow_account_data_mut, validate_owner, validate_signer,
    validate_writable, Fixed, InstructionReader, PriceSource, ZodError,
};

entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if instruction_data.is_empty() {
        msg!("Error: Instruction data is empty");
        return Err(ZodError::InvalidInstruction.into());
    }

    let instruction = ZodInstruction::from_discriminator(instruction_data[0]).ok_or_else(|| {
        msg!("Error: Unknown instruction");
        ZodError::InvalidInstruction
    })?;
    let data = &instruction_data[1..];

    match instruction {
        ZodInstruction::InitState => {
            msg!("Instruction: InitState");
            process_init_state_inner(program_id, accounts, data)
        }
        ZodInstruction::AddVault => {
            msg!("Instruction: AddVault");
            process_add_vault_inner(program_id, accounts, data)
        }
        ZodInstruction::CreateMargin => {
            msg!("Instruction: CreateMargin");
            process_create_margin_inner(program_id, accounts, data)
        }
        ZodInstruction::Deposit => {
            msg!("Instruction: Deposit");
            process_deposit_inner(program_id, accounts, data)
        }
        ZodInstruction::Withdraw => {
            msg!("Instruction: Withdraw");
            process_withdraw_inner(program_id, accounts, data)
        }
        ZodInstruction::Mint => {
            msg!("Instruction: Mint");
            process_mint_inner(program_id, accounts, data)
        }
        ZodInstruction::Burn => {
            msg!("Instruction: Burn");
            process_burn_inner(program_id, accounts, data)
        }
        ZodInstruction::LiquidatePosition => {
            msg!("Instruction: LiquidatePosition");
            process_liquidate_inner(program_id, accounts, data)
        }
        ZodInstruction::AddInsurance => {
            msg!("Instruction: AddInsurance");
            process_insurance_inner(program_id, accounts, data, true)
        }
        ZodInstruction::ReduceInsurance => {
            msg!("Instruction: ReduceInsurance");
            process_insurance_inner(program_id, accounts, data, false)
        }
        ZodInstruction::SettleBankruptcy => {
            msg!("Instruction: SettleBankruptcy");
            process_settle_bankruptcy_inner(program_id, accounts, data)
        }
    }
}

fn now() -> Result<u64, ZodError> {
    let clock = Clock::get().map_err(|_| ZodError::StaleOracle)?;
    Ok(clock.unix_timestamp as u64)
}

/// Parse an optional override price (permil of one smol USD). Only honored
/// on `devnet` builds; see [`Cache::resolve_price`].
fn read_price_source(reader: &mut InstructionReader) -> Result<PriceSource, ZodError> {
    match reader.read_opt_u64()? {
        None => Ok(PriceSource::Oracle),
        Some(raw) => {
            let permil = i64::try_from(raw).map_err(|_| ZodError::InvalidAmount)?;
            Ok(PriceSource::Override(Fixed::from_ratio(permil, 1000)?))
        }
    }
}

/// Borrow the cache account, checked by key against the address recorded in
/// the registry at initialization and by data size.
fn borrow_cache<'a>(
    cache_account: &'a AccountInfo,
    registry: &Registry,
) -> Result<&'a Cache, ZodError> {
    if cache_account.key() != &registry.lending_cache {
        msg!("Error: Cache account does not match registry");
        return Err(ZodError::InvalidAccount);
    }
    unsafe { borrow_account_data::<Cache>(cache_account) }
}

/// Expected accounts:
/// 0. `[writable]` Registry account (PDA)
/// 1. `[signer]` Admin
///
/// Data: lending_state (32), lending_cache (32), lending_margin (32),
/// synth_mint (32), state_nonce (1), lending_margin_nonce (1)
fn process_init_state_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 2 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let registry_account = &accounts[0];
    let admin_account = &accounts[1];

    validate_owner(registry_account, program_id)?;
    validate_writable(registry_account)?;
    validate_signer(admin_account)?;

    let mut reader = InstructionReader::new(data);
    let lending_state = reader.read_pubkey()?;
    let lending_cache = reader.read_pubkey()?;
    let lending_margin = reader.read_pubkey()?;
    let synth_mint = reader.read_pubkey()?;
    let state_nonce = reader.read_u8()?;
    let lending_margin_nonce = reader.read_u8()?;

    let registry = unsafe { borrow_account_data_mut::<Registry>(registry_account)? };
    process_init_state(
        registry,
        *admin_account.key(),
        lending_state,
        lending_cache,
        lending_margin,
        synth_mint,
        state_nonce,
        lending_margin_nonce,
    )?;

    msg!("Registry initialized");
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Registry account
/// 1. `[signer]` Admin
///
/// Data: vault (32), mint (32), oracle_symbol (24), decimals (1),
/// weight (2), liq_fee (2)
fn process_add_vault_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 2 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let registry_account = &accounts[0];
    let admin_account = &accounts[1];

    validate_owner(registry_account, program_id)?;
    validate_writable(registry_account)?;
    validate_signer(admin_account)?;

    let mut reader = InstructionReader::new(data);
    let vault = reader.read_pubkey()?;
    let mint = reader.read_pubkey()?;
    let oracle_symbol = reader.read_symbol()?;
    let decimals = reader.read_u8()?;
    let weight = reader.read_u16()?;
    let liq_fee = reader.read_u16()?;

    let info = CollateralInfo {
        mint,
        oracle_symbol,
        decimals,
        _padding: 0,
        weight,
        liq_fee,
        _padding2: [0; 2],
    };

    let registry = unsafe { borrow_account_data_mut::<Registry>(registry_account)? };
    let index = process_add_vault(registry, admin_account.key(), vault, info)?;
    log!("Vault registered at index {}", index);
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Margin account (PDA)
/// 1. `[signer]` Authority
/// 2. `[]` Registry account
///
/// Data: token_account (32)
fn process_create_margin_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let margin_account = &accounts[0];
    let authority_account = &accounts[1];
    let registry_account = &accounts[2];

    validate_owner(margin_account, program_id)?;
    validate_writable(margin_account)?;
    validate_signer(authority_account)?;
    validate_owner(registry_account, program_id)?;

    let (expected, bump) =
        derive_margin_pda(authority_account.key(), registry_account.key(), program_id);
    if margin_account.key() != &expected {
        msg!("Error: Margin account is not the correct PDA");
        return Err(ZodError::InvalidAccount.into());
    }

    let mut reader = InstructionReader::new(data);
    let token_account = reader.read_pubkey()?;

    let margin = unsafe { borrow_account_data_mut::<Margin>(margin_account)? };
    process_create_margin(margin, *authority_account.key(), token_account, bump)?;

    msg!("Margin account created");
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Margin account
/// 1. `[]` Registry account
/// 2. `[]` Lending cache account
/// 3. `[signer]` Authority
///
/// Data: mint (32), amount (8)
fn process_deposit_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let margin_account = &accounts[0];
    let registry_account = &accounts[1];
    let cache_account = &accounts[2];
    let authority_account = &accounts[3];

    validate_owner(margin_account, program_id)?;
    validate_writable(margin_account)?;
    validate_owner(registry_account, program_id)?;
    validate_signer(authority_account)?;

    let mut reader = InstructionReader::new(data);
    let mint = reader.read_pubkey()?;
    let amount = reader.read_u64()?;

    let registry = unsafe { borrow_account_data::<Registry>(registry_account)? };
    let cache = borrow_cache(cache_account, registry)?;
    let margin = unsafe { borrow_account_data_mut::<Margin>(margin_account)? };
    if &margin.authority != authority_account.key() {
        return Err(ZodError::Unauthorized.into());
    }

    process_deposit(margin, registry, cache, &mint, amount)?;
    log!("Deposited {}", amount);
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Margin account
/// 1. `[]` Registry account
/// 2. `[]` Lending cache account
/// 3. `[signer]` Authority
///
/// Data: mint (32), amount (8), override price flag (1) [+ price (8)]
fn process_withdraw_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let margin_account = &accounts[0];
    let registry_account = &accounts[1];
    let cache_account = &accounts[2];
    let authority_account = &accounts[3];

    validate_owner(margin_account, program_id)?;
    validate_writable(margin_account)?;
    validate_owner(registry_account, program_id)?;
    validate_signer(authority_account)?;

    let mut reader = InstructionReader::new(data);
    let mint = reader.read_pubkey()?;
    let amount = reader.read_u64()?;
    let price_source = read_price_source(&mut reader)?;

    let registry = unsafe { borrow_account_data::<Registry>(registry_account)? };
    let cache = borrow_cache(cache_account, registry)?;
    let margin = unsafe { borrow_account_data_mut::<Margin>(margin_account)? };
    if &margin.authority != authority_account.key() {
        return Err(ZodError::Unauthorized.into());
    }

    process_withdraw(margin, registry, cache, &mint, amount, now()?, price_source)?;
    log!("Withdrew {}", amount);
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Margin account
/// 1. `[writable]` Registry account
/// 2. `[]` Lending cache account
/// 3. `[signer]` Authority
///
/// Data: amount (8), override price flag (1) [+ price (8)]
fn process_mint_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let margin_account = &accounts[0];
    let registry_account = &accounts[1];
    let cache_account = &accounts[2];
    let authority_account = &accounts[3];

    validate_owner(margin_account, program_id)?;
    validate_writable(margin_account)?;
    validate_owner(registry_account, program_id)?;
    validate_writable(registry_account)?;
    validate_signer(authority_account)?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u64()?;
    let price_source = read_price_source(&mut reader)?;

    let registry = unsafe { borrow_account_data_mut::<Registry>(registry_account)? };
    let cache = borrow_cache(cache_account, registry)?;
    let margin = unsafe { borrow_account_data_mut::<Margin>(margin_account)? };
    if &margin.authority != authority_account.key() {
        return Err(ZodError::Unauthorized.into());
    }

    process_mint(margin, registry, cache, amount, now()?, price_source)?;
    log!("Minted {}", amount);
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Margin account
/// 1. `[writable]` Registry account
/// 2. `[signer]` Authority
///
/// Data: amount (8)
fn process_burn_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let margin_account = &accounts[0];
    let registry_account = &accounts[1];
    let authority_account = &accounts[2];

    validate_owner(margin_account, program_id)?;
    validate_writable(margin_account)?;
    validate_owner(registry_account, program_id)?;
    validate_writable(registry_account)?;
    validate_signer(authority_account)?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u64()?;

    let registry = unsafe { borrow_account_data_mut::<Registry>(registry_account)? };
    let margin = unsafe { borrow_account_data_mut::<Margin>(margin_account)? };
    if &margin.authority != authority_account.key() {
        return Err(ZodError::Unauthorized.into());
    }

    process_burn(margin, registry, amount)?;
    log!("Burned {}", amount);
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Target margin account
/// 1. `[writable]` Liquidator margin account
/// 2. `[writable]` Registry account
/// 3. `[]` Lending cache account
/// 4. `[signer]` Liquidator authority
///
/// Data: quote mint (32), amount (8), override price flag (1) [+ price (8)]
fn process_liquidate_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 5 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let liqee_account = &accounts[0];
    let liqor_account = &accounts[1];
    let registry_account = &accounts[2];
    let cache_account = &accounts[3];
    let authority_account = &accounts[4];

    validate_owner(liqee_account, program_id)?;
    validate_writable(liqee_account)?;
    validate_owner(liqor_account, program_id)?;
    validate_writable(liqor_account)?;
    validate_owner(registry_account, program_id)?;
    validate_writable(registry_account)?;
    validate_signer(authority_account)?;

    if liqee_account.key() == liqor_account.key() {
        msg!("Error: Cannot self-liquidate");
        return Err(ZodError::InvalidAccount.into());
    }

    let mut reader = InstructionReader::new(data);
    let quote_mint = reader.read_pubkey()?;
    let amount = reader.read_u64()?;
    let price_source = read_price_source(&mut reader)?;

    let registry = unsafe { borrow_account_data_mut::<Registry>(registry_account)? };
    let cache = borrow_cache(cache_account, registry)?;
    let liqee = unsafe { borrow_account_data_mut::<Margin>(liqee_account)? };
    let liqor = unsafe { borrow_account_data_mut::<Margin>(liqor_account)? };
    if &liqor.authority != authority_account.key() {
        return Err(ZodError::Unauthorized.into());
    }

    let result = process_liquidate(
        liqee,
        liqor,
        registry,
        cache,
        &quote_mint,
        amount,
        now()?,
        price_source,
    )?;
    log!("Repaid {}", result.assets_repaid.floor_i64().unwrap_or(0));
    log!(
        "Seized {}",
        result.collateral_seized.floor_i64().unwrap_or(0)
    );
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Registry account
/// 1. `[signer]` Admin
///
/// Data: amount (8)
fn process_insurance_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
    add: bool,
) -> ProgramResult {
    if accounts.len() < 2 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let registry_account = &accounts[0];
    let admin_account = &accounts[1];

    validate_owner(registry_account, program_id)?;
    validate_writable(registry_account)?;
    validate_signer(admin_account)?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u64()?;

    let registry = unsafe { borrow_account_data_mut::<Registry>(registry_account)? };
    if add {
        process_add_insurance(registry, admin_account.key(), amount)?;
    } else {
        process_reduce_insurance(registry, admin_account.key(), amount)?;
    }
    log!("Insurance fund now {}", registry.insurance);
    Ok(())
}

/// Expected accounts:
/// 0. `[writable]` Bankrupt margin account
/// 1. `[writable]` Settler margin account
/// 2. `[writable]` Registry account
/// 3. `[]` Lending cache account
/// 4. `[signer]` Settler authority
///
/// Data: override price flag (1) [+ price (8)]
fn process_settle_bankruptcy_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 5 {
        return Err(ZodError::InvalidInstruction.into());
    }
    let liqee_account = &accounts[0];
    let liqor_account = &accounts[1];
    let registry_account = &accounts[2];
    let cache_account = &accounts[3];
    let authority_account = &accounts[4];

    validate_owner(liqee_account, program_id)?;
    validate_writable(liqee_account)?;
    validate_owner(liqor_account, program_id)?;
    validate_writable(liqor_account)?;
    validate_owner(registry_account, program_id)?;
    validate_writable(registry_account)?;
    validate_signer(authority_account)?;

    if liqee_account.key() == liqor_account.key() {
        return Err(ZodError::InvalidAccount.into());
    }

    let mut reader = InstructionReader::new(data);
    let price_source = read_price_source(&mut reader)?;

    let registry = unsafe { borrow_account_data_mut::<Registry>(registry_account)? };
    let cache = borrow_cache(cache_account, registry)?;
    let liqee = unsafe { borrow_account_data_mut::<Margin>(liqee_account)? };
    let liqor = unsafe { borrow_account_data_mut::<Margin>(liqor_account)? };
    if &liqor.authority != authority_account.key() {
        return Err(ZodError::Unauthorized.into());
    }

    let result =
        process_settle_bankruptcy(liqee, liqor, registry, cache, now()?, price_source)?;
    log!(
        "Wrote off {}",
        result.written_off.floor_i64().unwrap_or(0)
    );
    log!("Insurance drew {}", result.insurance_drawn);
    Ok(())
}
