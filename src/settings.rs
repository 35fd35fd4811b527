use std::{env, time::Duration};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::network::Network;

const DEFAULT_SETTINGS: &str = include_str!("default_settings.toml");

/// Static configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Public base URL the frame posts back to.
    pub host: String,
    pub bind_address: String,
    pub state_secret: String,
    pub static_image_url: String,
    pub rpc_timeout_secs: u64,
    pub coingecko_url: String,
    pub supply: Supply,
    pub links: Links,
    pub evm: EvmPools,
    pub osmosis: OsmosisPool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Supply {
    pub circulating: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Links {
    pub pagedao: String,
    pub channel: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvmPools {
    pub ethereum: EvmPool,
    pub optimism: EvmPool,
    pub base: EvmPool,
}

/// A PAGE/paired-asset constant-product pool on an EVM chain.
#[derive(Debug, Clone, Deserialize)]
pub struct EvmPool {
    /// Endpoints in priority order.
    pub rpc_urls: Vec<String>,
    pub pool: String,
    pub page_token: String,
    pub page_decimals: u32,
    pub paired_decimals: u32,
    /// CoinGecko id of the paired asset.
    pub paired_price_id: String,
    pub dex_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsmosisPool {
    pub lcd_url: String,
    pub pool_id: u64,
    pub page_denom: String,
    pub paired_denom: String,
    pub page_decimals: u32,
    pub paired_decimals: u32,
    pub paired_price_id: String,
    pub dex_url: String,
}

impl Settings {
    /// Defaults, then `Settings.{toml,json}`, then `PAGEFRAMES_*` variables.
    /// `URL`, which Netlify sets for a deployed site, overrides `host`.
    pub fn load() -> Result<Self> {
        let mut settings = Self::defaults()?;
        settings
            .merge(File::with_name("Settings").required(false))
            .context("Reading Settings file")?;
        settings
            .merge(Environment::with_prefix("PAGEFRAMES").separator("__"))
            .context("Reading PAGEFRAMES environment")?;
        if let Ok(url) = env::var("URL") {
            settings.set("host", url)?;
        }
        settings.try_into().context("Parsing settings")
    }

    /// Only the embedded defaults, ignoring files and environment.
    pub fn embedded() -> Result<Self> {
        Self::defaults()?
            .try_into()
            .context("Parsing embedded settings")
    }

    fn defaults() -> Result<Config> {
        let mut settings = Config::default();
        settings
            .merge(File::from_str(DEFAULT_SETTINGS, FileFormat::Toml))
            .context("Reading embedded settings")?;
        Ok(settings)
    }

    pub fn evm_pool(&self, network: Network) -> Option<&EvmPool> {
        match network {
            Network::Ethereum => Some(&self.evm.ethereum),
            Network::Optimism => Some(&self.evm.optimism),
            Network::Base => Some(&self.evm.base),
            Network::Osmosis => None,
        }
    }

    pub fn dex_url(&self, network: Network) -> &str {
        match self.evm_pool(network) {
            Some(pool) => &pool.dex_url,
            None => &self.osmosis.dex_url,
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn frame_url(&self) -> String {
        format!("{}/frame", self.host.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let settings = Settings::embedded().unwrap();
        assert_eq!(settings.supply.circulating, 42_500_000.0);
        assert_eq!(settings.evm.ethereum.rpc_urls[0], "https://eth.llamarpc.com");
        assert_eq!(settings.evm.ethereum.rpc_urls.len(), 6);
        assert_eq!(settings.evm.optimism.rpc_urls.len(), 4);
        assert_eq!(settings.evm.base.rpc_urls.len(), 4);
        assert_eq!(settings.osmosis.paired_denom, "uosmo");
        assert!(settings.evm_pool(Network::Osmosis).is_none());
    }

    #[test]
    fn frame_url_has_no_double_slash() {
        let mut settings = Settings::embedded().unwrap();
        settings.host = "https://frames.example/".to_owned();
        assert_eq!(settings.frame_url(), "https://frames.example/frame");
    }
}
