//! Keeper configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC URL for Solana cluster
    pub rpc_url: String,

    /// WebSocket URL for event subscription
    pub ws_url: String,

    /// Margin program ID
    pub program_id: Pubkey,

    /// Keeper wallet keypair path
    pub keypair_path: String,

    /// Polling interval in seconds
    pub poll_interval_secs: u64,

    /// Maximum liquidations per batch
    pub max_liquidations_per_batch: usize,

    /// Cap on the debt repaid per liquidation, in native synthetic units
    pub max_repay: u64,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ZOD_KEEPER_CONFIG")
            .unwrap_or_else(|_| "keeper-config.toml".to_string());

        let config_str = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read config file: {}", config_path))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Create default configuration
    pub fn default_devnet() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            ws_url: "wss://api.devnet.solana.com".to_string(),
            program_id: Pubkey::new_from_array(zod_margin::ID),
            keypair_path: "~/.config/solana/id.json".to_string(),
            poll_interval_secs: 1,
            max_liquidations_per_batch: 5,
            max_repay: 1_000_000_000,
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_devnet();
        let toml_str = toml::to_string_pretty(&config)
            .context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }
}
