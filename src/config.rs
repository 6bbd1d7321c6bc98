use alloy::primitives::{address, Address};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest fee value a Uniswap V3 `uint24` fee tier can carry in practice (100%).
const MAX_FEE_TIER: u32 = 1_000_000;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub uniswap: UniswapConfig,
    #[serde(default)]
    pub quote: QuoteConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    #[serde(default = "default_rpc_urls")]
    pub rpc_urls: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UniswapConfig {
    #[serde(default = "default_factory")]
    pub factory: Address,
    #[serde(default = "default_quoter")]
    pub quoter: Address,
    #[serde(default = "default_reference_asset")]
    pub reference_asset: Address,
    #[serde(default = "default_reference_symbol")]
    pub reference_symbol: String,
    #[serde(default = "default_reference_decimals")]
    pub reference_decimals: u8,
    /// Hundredths of a basis point: 100 = 0.01%.
    #[serde(default = "default_fee_tier")]
    pub fee_tier: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuoteConfig {
    #[serde(default = "default_price_impact")]
    pub price_impact_percent: f64,
    #[serde(default = "default_probe_amounts")]
    pub probe_amounts: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_request_timeout() -> u64 { 10 }
fn default_rpc_urls() -> Vec<String> {
    [
        "https://geth-geth.ede2390e1937cf50.dyndns.dappnode.io",
        "https://eth-mainnet.public.blastapi.io",
        "https://rpc.ankr.com/eth",
        "https://ethereum.publicnode.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_factory() -> Address { address!("1F98431c8aD98523631AE4a59f267346ea31F984") }
fn default_quoter() -> Address { address!("b27308f9F90D607463bb33eA1BeBb41C27CE5AB6") }
fn default_reference_asset() -> Address { address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2") }
fn default_reference_symbol() -> String { "WETH".to_string() }
fn default_reference_decimals() -> u8 { 18 }
fn default_fee_tier() -> u32 { 100 }
fn default_price_impact() -> f64 { 0.3 }
fn default_probe_amounts() -> Vec<f64> { vec![0.1, 0.01] }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_urls: default_rpc_urls(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for UniswapConfig {
    fn default() -> Self {
        Self {
            factory: default_factory(),
            quoter: default_quoter(),
            reference_asset: default_reference_asset(),
            reference_symbol: default_reference_symbol(),
            reference_decimals: default_reference_decimals(),
            fee_tier: default_fee_tier(),
        }
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            price_impact_percent: default_price_impact(),
            probe_amounts: default_probe_amounts(),
        }
    }
}

impl Config {
    /// Loads `CONFIG_PATH` (or `config.toml`), falling back to the built-in
    /// mainnet defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!("{} not found, using default configuration", path.display());
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.rpc_urls.is_empty() {
            return Err(ConfigError::Invalid("chain.rpc_urls must not be empty".into()));
        }
        if self.uniswap.fee_tier == 0 || self.uniswap.fee_tier >= MAX_FEE_TIER {
            return Err(ConfigError::Invalid(format!(
                "uniswap.fee_tier {} out of range",
                self.uniswap.fee_tier
            )));
        }
        if !self.quote.price_impact_percent.is_finite() {
            return Err(ConfigError::Invalid("quote.price_impact_percent must be finite".into()));
        }

        let probes = &self.quote.probe_amounts;
        if probes.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(ConfigError::Invalid("quote.probe_amounts must be positive".into()));
        }
        if probes.windows(2).any(|w| w[1] >= w[0]) {
            return Err(ConfigError::Invalid(
                "quote.probe_amounts must be strictly decreasing".into(),
            ));
        }

        Ok(())
    }
}
