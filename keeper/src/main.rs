//! Zod Liquidation Keeper
//!
//! Off-chain service that monitors margin account health and submits
//! liquidations for undercollateralized accounts and bankruptcy settlements
//! for accounts whose collateral is exhausted. The keeper repays debt from
//! its own margin account, so that account must be funded and minted
//! against before the service is useful.

mod config;
mod health;
mod priority_queue;
mod tx_builder;

use anyhow::{Context, Result};
use config::Config;
use health::MarginHealth;
use priority_queue::HealthQueue;
use solana_client::{
    rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::RpcFilterType,
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time;
use zod_margin::pda::{MARGIN_SEED, REGISTRY_SEED};
use zod_margin::{Cache, Margin, Registry};

/// Protocol addresses derived once at startup.
struct Addresses {
    registry: Pubkey,
    /// The keeper's own margin account; pays for repaid debt
    keeper_margin: Pubkey,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Zod Liquidation Keeper");

    // Load configuration
    let config = Config::load().unwrap_or_else(|_| {
        log::warn!("Failed to load config, using default devnet config");
        Config::default_devnet()
    });

    log::info!("Connected to RPC: {}", config.rpc_url);
    log::info!("Monitoring margin program: {}", config.program_id);

    // Initialize RPC client
    let client = RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    );

    // Load keeper wallet
    let keeper = load_keypair(&config.keypair_path)?;
    log::info!("Keeper wallet: {}", keeper.pubkey());

    let (registry, _) =
        Pubkey::find_program_address(&[REGISTRY_SEED], &config.program_id);
    let (keeper_margin, _) = Pubkey::find_program_address(
        &[keeper.pubkey().as_ref(), registry.as_ref(), MARGIN_SEED],
        &config.program_id,
    );
    let addresses = Addresses {
        registry,
        keeper_margin,
    };
    log::info!("Registry: {}", addresses.registry);
    log::info!("Keeper margin account: {}", addresses.keeper_margin);

    // Initialize health queue
    let mut queue = HealthQueue::new();

    log::info!("Keeper service started. Monitoring for liquidations...");

    // Main event loop
    let mut interval = time::interval(Duration::from_secs(config.poll_interval_secs));

    loop {
        interval.tick().await;

        if let Err(e) = update_health_queue(&mut queue, &client, &config, &addresses).await {
            log::error!("Error refreshing health queue: {}", e);
            continue;
        }

        if let Err(e) =
            process_liquidations(&mut queue, &client, &config, &addresses, &keeper).await
        {
            log::error!("Error processing liquidations: {}", e);
        }

        // Log queue status
        if !queue.is_empty() {
            log::debug!("Health queue size: {}", queue.len());

            if let Some(worst) = queue.peek() {
                log::debug!(
                    "Worst health: {}",
                    health::display_health(worst.health)
                );
            }
        }
    }
}

/// Fetch every margin account plus current registry and cache state, and
/// rebuild the health queue from them.
async fn update_health_queue(
    queue: &mut HealthQueue,
    client: &RpcClient,
    config: &Config,
    addresses: &Addresses,
) -> Result<()> {
    let registry_data = client
        .get_account_data(&addresses.registry)
        .context("Failed to fetch registry account")?;
    let registry: Registry = health::parse_registry(&registry_data)?;

    let cache_key = Pubkey::new_from_array(registry.lending_cache);
    let cache_data = client
        .get_account_data(&cache_key)
        .context("Failed to fetch lending cache account")?;
    let cache: Cache = health::parse_cache(&cache_data)?;

    let accounts = client
        .get_program_accounts_with_config(
            &config.program_id,
            RpcProgramAccountsConfig {
                filters: Some(vec![RpcFilterType::DataSize(Margin::LEN as u64)]),
                account_config: RpcAccountInfoConfig {
                    encoding: None,
                    data_slice: None,
                    commitment: Some(CommitmentConfig::confirmed()),
                    min_context_slot: None,
                },
                with_context: None,
                sort_results: None,
            },
        )
        .context("Failed to fetch margin accounts")?;

    let now = unix_now()?;
    for (key, account) in accounts {
        let margin = match health::parse_margin(&account.data) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Skipping unparseable account {}: {}", key, e);
                continue;
            }
        };
        match health::assess(key, &margin, &registry, &cache, now) {
            Ok(h) => queue.push(h),
            Err(e) => log::warn!("Skipping account {}: {}", key, e),
        }
    }

    Ok(())
}

/// Submit liquidations and settlements for flagged accounts, worst first.
async fn process_liquidations(
    queue: &mut HealthQueue,
    client: &RpcClient,
    config: &Config,
    addresses: &Addresses,
    keeper: &Keypair,
) -> Result<()> {
    let mut candidates = queue.get_liquidatable();
    candidates.sort_by_key(|h| h.health);
    let bankrupt = queue.get_bankrupt();

    if candidates.is_empty() && bankrupt.is_empty() {
        log::debug!("No accounts need liquidation");
        return Ok(());
    }

    log::info!(
        "Found {} liquidatable and {} bankrupt accounts",
        candidates.len(),
        bankrupt.len()
    );

    let registry_data = client
        .get_account_data(&addresses.registry)
        .context("Failed to fetch registry account")?;
    let registry: Registry = health::parse_registry(&registry_data)?;
    let cache_key = Pubkey::new_from_array(registry.lending_cache);
    // Debt is repaid against the quote asset, listed first in the registry
    let quote_mint = Pubkey::new_from_array(registry.collaterals[0].mint);

    let batch: Vec<(MarginHealth, bool)> = candidates
        .into_iter()
        .map(|h| (h, false))
        .chain(bankrupt.into_iter().map(|h| (h, true)))
        .take(config.max_liquidations_per_batch)
        .collect();

    for (target, settle) in batch {
        if target.margin == addresses.keeper_margin {
            continue;
        }

        log::info!(
            "{} account {} (health: {})",
            if settle { "Settling" } else { "Liquidating" },
            target.margin,
            health::display_health(target.health)
        );

        let instruction = if settle {
            tx_builder::build_settle_instruction(
                &config.program_id,
                &target.margin,
                &addresses.keeper_margin,
                &addresses.registry,
                &cache_key,
                &keeper.pubkey(),
            )
        } else {
            tx_builder::build_liquidate_instruction(
                &config.program_id,
                &target.margin,
                &addresses.keeper_margin,
                &addresses.registry,
                &cache_key,
                &keeper.pubkey(),
                &quote_mint,
                config.max_repay,
            )
        };

        let blockhash = client
            .get_latest_blockhash()
            .context("Failed to fetch blockhash")?;
        let transaction = tx_builder::build_keeper_transaction(instruction, keeper, blockhash)?;

        match client.send_and_confirm_transaction(&transaction) {
            Ok(signature) => {
                log::info!("Submitted: {}", signature);
                queue.remove(&target.margin);
            }
            Err(e) => {
                log::error!("Failed to process account {}: {}", target.margin, e);
            }
        }
    }

    Ok(())
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock before unix epoch")?
        .as_secs())
}

/// Load keeper keypair from file
fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded_path = shellexpand::tilde(path);
    let bytes = std::fs::read(expanded_path.as_ref())
        .context(format!("Failed to read keypair from {}", path))?;

    let keypair = if bytes.first() == Some(&b'[') {
        // JSON format
        let json_data: Vec<u8> = serde_json::from_slice(&bytes)
            .context("Failed to parse keypair JSON")?;
        Keypair::try_from(&json_data[..])
            .context("Failed to create keypair from bytes")?
    } else {
        // Binary format
        Keypair::try_from(&bytes[..])
            .context("Failed to create keypair from bytes")?
    };

    Ok(keypair)
}
