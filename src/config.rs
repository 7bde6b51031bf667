//! Network and pipeline configuration
//!
//! Loaded once at startup from a TOML file (or the built-in devnet table)
//! and never mutated afterwards. `FAIRMINT_RPC_URL` and
//! `FAIRMINT_FRONTEND_URL` override the file values.

use crate::decode::InitializeTokenConfigData;
use crate::types::pubkey_string;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const RPC_URL_ENV: &str = "FAIRMINT_RPC_URL";
pub const FRONTEND_URL_ENV: &str = "FAIRMINT_FRONTEND_URL";

/// Target network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Devnet,
    Mainnet,
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            other => bail!("Unknown network: {}", other),
        }
    }
}

/// Swap program used to bootstrap the liquidity pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    #[serde(with = "pubkey_string")]
    pub program_id: Pubkey,
    #[serde(with = "pubkey_string")]
    pub amm_config: Pubkey,
    #[serde(with = "pubkey_string")]
    pub create_pool_fee_receiver: Pubkey,
}

/// Immutable per-network bundle of endpoints and account addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network: Network,
    pub rpc_url: String,
    pub frontend_url: String,
    #[serde(with = "pubkey_string")]
    pub program_id: Pubkey,
    #[serde(with = "pubkey_string")]
    pub metadata_program_id: Pubkey,
    #[serde(with = "pubkey_string")]
    pub system_deployer: Pubkey,
    #[serde(with = "pubkey_string")]
    pub protocol_fee_account: Pubkey,
    #[serde(with = "pubkey_string")]
    pub lookup_table: Pubkey,
    /// Account holding the launch rules; passed through to initialize
    #[serde(with = "pubkey_string")]
    pub launch_rule_account: Pubkey,
    pub swap: SwapConfig,
}

fn key(s: &str) -> anyhow::Result<Pubkey> {
    Pubkey::from_str(s).with_context(|| format!("Invalid built-in address {}", s))
}

impl NetworkConfig {
    /// Built-in devnet deployment
    pub fn devnet() -> anyhow::Result<Self> {
        Ok(Self {
            network: Network::Devnet,
            rpc_url: "https://api.devnet.solana.com".to_string(),
            frontend_url: "https://test.flipflop.plus".to_string(),
            program_id: key("8GM2N7qQjzMyhqewu8jpDgzUh2BJbtBxSY1WzSFeFm6U")?,
            metadata_program_id: key("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s")?,
            system_deployer: key("CXzddeiDgbTTxNnd1apeUGE7E1UAdvBoysf7c271AA79")?,
            protocol_fee_account: key("CXzddeiDgbTTxNnd1apeUGE7E1UAdvBoysf7c271AA79")?,
            lookup_table: key("EebRqpLtUgjX17pJJNNbd6ngtYa34VGa51oYsibwJRXy")?,
            launch_rule_account: key("CXzddeiDgbTTxNnd1apeUGE7E1UAdvBoysf7c271AA79")?,
            swap: SwapConfig {
                program_id: key("CPMDWBwJDtYax9qW7AyRuVC19Cc4L4Vcy4n2BHAbHkCW")?,
                amm_config: key("9zSzfkYy6awexsHvmggeH36pfVUdDGyCcwmjT3AQPBj6")?,
                create_pool_fee_receiver: key("G11FKBRaAkHAKuLCgLM6K6NUc9rTjPAznRCjZifrTQe2")?,
            },
        })
    }

    /// Public page of a token on the frontend
    pub fn token_page_url(&self, mint: &Pubkey) -> String {
        format!("{}/token/{}", self.frontend_url.trim_end_matches('/'), mint)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(RPC_URL_ENV) {
            if !url.is_empty() {
                self.rpc_url = url;
            }
        }
        if let Ok(url) = std::env::var(FRONTEND_URL_ENV) {
            if !url.is_empty() {
                self.frontend_url = url;
            }
        }
    }
}

/// Default initialize parameters for one token type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchPreset {
    pub token_type: String,
    pub target_eras: u32,
    pub epoches_per_era: u64,
    pub target_seconds_per_epoch: u64,
    pub reduce_ratio: f64,
    pub initial_mint_size: u64,
    pub initial_target_mint_size_per_epoch: u64,
    pub fee_rate: u64,
    pub liquidity_tokens_ratio: f64,
}

impl LaunchPreset {
    /// Instruction parameters with the epoch start stamped at `start_timestamp`
    pub fn to_init_config(&self, start_timestamp: i64) -> InitializeTokenConfigData {
        InitializeTokenConfigData {
            target_eras: self.target_eras,
            epoches_per_era: self.epoches_per_era,
            target_seconds_per_epoch: self.target_seconds_per_epoch,
            reduce_ratio: self.reduce_ratio,
            initial_mint_size: self.initial_mint_size,
            initial_target_mint_size_per_epoch: self.initial_target_mint_size_per_epoch,
            fee_rate: self.fee_rate,
            liquidity_tokens_ratio: self.liquidity_tokens_ratio,
            start_timestamp,
        }
    }
}

fn default_presets() -> Vec<LaunchPreset> {
    vec![
        LaunchPreset {
            token_type: "standard".to_string(),
            target_eras: 1,
            epoches_per_era: 200,
            target_seconds_per_epoch: 3600,
            reduce_ratio: 0.75,
            initial_mint_size: 100_000_000_000_000,
            initial_target_mint_size_per_epoch: 1_000_000_000_000_000,
            fee_rate: 100_000_000,
            liquidity_tokens_ratio: 0.2,
        },
        LaunchPreset {
            token_type: "meme".to_string(),
            target_eras: 1,
            epoches_per_era: 100,
            target_seconds_per_epoch: 600,
            reduce_ratio: 0.5,
            initial_mint_size: 1_000_000_000_000_000,
            initial_target_mint_size_per_epoch: 10_000_000_000_000_000,
            fee_rate: 50_000_000,
            liquidity_tokens_ratio: 0.2,
        },
    ]
}

/// Submission pipeline tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_mint_compute_units")]
    pub mint_compute_units: u32,
    #[serde(default = "default_compute_units")]
    pub initialize_compute_units: u32,
    #[serde(default = "default_compute_units")]
    pub refund_compute_units: u32,
    /// Window during which a second submission is refused
    #[serde(default = "default_lock_window_ms")]
    pub lock_window_ms: u64,
    #[serde(default = "default_confirm_poll_ms")]
    pub confirm_poll_interval_ms: u64,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
}

fn default_mint_compute_units() -> u32 { 500_000 }
fn default_compute_units() -> u32 { 300_000 }
fn default_lock_window_ms() -> u64 { 2_000 }
fn default_confirm_poll_ms() -> u64 { 500 }
fn default_confirm_timeout_secs() -> u64 { 60 }

impl PipelineConfig {
    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mint_compute_units: default_mint_compute_units(),
            initialize_compute_units: default_compute_units(),
            refund_compute_units: default_compute_units(),
            lock_window_ms: default_lock_window_ms(),
            confirm_poll_interval_ms: default_confirm_poll_ms(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default = "default_presets")]
    pub presets: Vec<LaunchPreset>,

    /// Expose prometheus counters for submissions
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

fn default_true() -> bool { true }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.network.apply_env_overrides();
        Ok(config)
    }

    /// Configuration for a network without a file. Only devnet is built in.
    pub fn for_network(network: Network) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut network_config = match network {
            Network::Devnet => NetworkConfig::devnet()?,
            Network::Mainnet => bail!("Mainnet requires a config file (--config)"),
        };
        network_config.apply_env_overrides();
        Ok(Self {
            network: network_config,
            pipeline: PipelineConfig::default(),
            presets: default_presets(),
            enable_metrics: true,
        })
    }

    pub fn preset(&self, token_type: &str) -> Option<&LaunchPreset> {
        self.presets.iter().find(|p| p.token_type == token_type)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.network.rpc_url.is_empty() {
            bail!("network.rpc_url must not be empty");
        }
        if self.pipeline.lock_window_ms == 0 {
            bail!("pipeline.lock_window_ms must be positive");
        }
        if self.pipeline.confirm_poll_interval_ms == 0 {
            bail!("pipeline.confirm_poll_interval_ms must be positive");
        }
        for preset in &self.presets {
            if !(preset.reduce_ratio > 0.0 && preset.reduce_ratio <= 1.0) {
                bail!("preset {}: reduce_ratio must be in (0, 1]", preset.token_type);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[network]
network = "mainnet"
rpc_url = "https://rpc.example.org"
frontend_url = "https://fair.example.org/"
program_id = "8GM2N7qQjzMyhqewu8jpDgzUh2BJbtBxSY1WzSFeFm6U"
metadata_program_id = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s"
system_deployer = "CXzddeiDgbTTxNnd1apeUGE7E1UAdvBoysf7c271AA79"
protocol_fee_account = "CXzddeiDgbTTxNnd1apeUGE7E1UAdvBoysf7c271AA79"
lookup_table = "EebRqpLtUgjX17pJJNNbd6ngtYa34VGa51oYsibwJRXy"
launch_rule_account = "CXzddeiDgbTTxNnd1apeUGE7E1UAdvBoysf7c271AA79"

[network.swap]
program_id = "CPMDWBwJDtYax9qW7AyRuVC19Cc4L4Vcy4n2BHAbHkCW"
amm_config = "9zSzfkYy6awexsHvmggeH36pfVUdDGyCcwmjT3AQPBj6"
create_pool_fee_receiver = "G11FKBRaAkHAKuLCgLM6K6NUc9rTjPAznRCjZifrTQe2"

[pipeline]
lock_window_ms = 3000
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(SAMPLE);
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.network.network, Network::Mainnet);
        assert_eq!(config.pipeline.lock_window_ms, 3000);
        assert_eq!(config.pipeline.mint_compute_units, 500_000);
        assert!(config.preset("standard").is_some());
        assert!(config.enable_metrics);
    }

    #[test]
    fn test_invalid_pubkey_rejected() {
        let broken = SAMPLE.replace("EebRqpLtUgjX17pJJNNbd6ngtYa34VGa51oYsibwJRXy", "not-a-key");
        let file = write_config(&broken);
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_token_page_url_trims_slash() {
        let file = write_config(SAMPLE);
        let config = Config::from_file(file.path()).unwrap();
        let mint = Pubkey::new_unique();
        assert_eq!(
            config.network.token_page_url(&mint),
            format!("https://fair.example.org/token/{}", mint)
        );
    }

    #[test]
    fn test_devnet_table() {
        let devnet = NetworkConfig::devnet().unwrap();
        assert_eq!(devnet.network, Network::Devnet);
        assert_eq!(devnet.system_deployer, devnet.protocol_fee_account);
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("devnet".parse::<Network>().unwrap(), Network::Devnet);
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("testnet".parse::<Network>().is_err());
        assert!(Config::for_network(Network::Mainnet).is_err());
    }

    #[test]
    fn test_preset_stamps_start_time() {
        let config = Config::for_network(Network::Devnet).unwrap();
        let preset = config.preset("meme").unwrap();
        let init = preset.to_init_config(1_700_000_000);
        assert_eq!(init.start_timestamp, 1_700_000_000);
        assert_eq!(init.fee_rate, preset.fee_rate);
    }
}
