use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;

use crate::{
    cg::CoinGeckoAPI,
    error::FrameError,
    network::{Network, PerNetwork, PriceSnapshot, TvlSnapshot},
    provider::ProviderSelector,
    reserves::{fetch_evm_reserves, fetch_osmosis_reserves, PoolReserves},
    rpc::HttpTransport,
    settings::Settings,
    MarketSource, NamedAPI, PriceAPI,
};

/// Price and liquidity of one network's pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkQuote {
    pub price: f64,
    pub tvl: f64,
    pub reserves: PoolReserves,
}

impl NetworkQuote {
    pub fn from_reserves(reserves: PoolReserves) -> Result<Self> {
        let price = reserves.spot_price()?;
        Ok(Self {
            price,
            tvl: reserves.tvl(price),
            reserves,
        })
    }
}

/// Quotes for every network; `None` marks a network whose source failed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarketSnapshot {
    pub quotes: PerNetwork<Option<NetworkQuote>>,
}

impl MarketSnapshot {
    pub fn prices(&self) -> PriceSnapshot {
        self.quotes.map(|quote| quote.map(|quote| quote.price))
    }

    pub fn tvl(&self) -> TvlSnapshot {
        self.quotes.map(|quote| quote.map(|quote| quote.tvl))
    }
}

/// Live PAGE market data from pool contracts, Osmosis LCD and CoinGecko.
pub struct PageMarket {
    settings: Arc<Settings>,
    selector: ProviderSelector,
    prices: Box<dyn PriceAPI + Send + Sync>,
    price_source_name: String,
    client: Client,
}

impl PageMarket {
    pub fn new(
        settings: Arc<Settings>,
        selector: ProviderSelector,
        prices: Box<dyn PriceAPI + Send + Sync>,
        price_source_name: String,
        client: Client,
    ) -> Self {
        Self {
            settings,
            selector,
            prices,
            price_source_name,
            client,
        }
    }

    pub fn from_settings(settings: Arc<Settings>) -> Result<Self> {
        let timeout = settings.rpc_timeout();
        let transport = Arc::new(HttpTransport::build(timeout)?);
        let selector = ProviderSelector::from_settings(&settings, transport);
        let coingecko = CoinGeckoAPI::build(&settings.coingecko_url, timeout)?;
        let name = coingecko.get_name();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(
            settings,
            selector,
            Box::new(coingecko),
            name,
            client,
        ))
    }

    /// USD prices of every paired asset in one batched request. Osmosis is
    /// best-effort, so if the full batch fails it is retried without the
    /// Osmosis-only id.
    async fn paired_prices(&self) -> Result<HashMap<String, f64>, FrameError> {
        let mut required: Vec<&str> = Vec::new();
        for &network in Network::EVM.iter() {
            if let Some(pool) = self.settings.evm_pool(network) {
                if !required.contains(&pool.paired_price_id.as_str()) {
                    required.push(&pool.paired_price_id);
                }
            }
        }
        let osmosis_id = self.settings.osmosis.paired_price_id.as_str();
        let mut ids = required.clone();
        if !ids.contains(&osmosis_id) {
            ids.push(osmosis_id);
        }
        let prices = match self.prices.get_price(&ids, "usd").await {
            Ok(prices) => prices,
            Err(error) if ids.len() > required.len() => {
                warn!(
                    "{} price batch failed, retrying without {}: {:#}",
                    self.price_source_name, osmosis_id, error
                );
                self.prices
                    .get_price(&required, "usd")
                    .await
                    .map_err(|error| FrameError::fetch(self.price_source_name.as_str(), error))?
            }
            Err(error) => return Err(FrameError::fetch(self.price_source_name.as_str(), error)),
        };
        info!("{} prices {:?}", self.price_source_name, prices);
        Ok(prices.into_iter().collect())
    }

    fn usd_price(&self, prices: &HashMap<String, f64>, id: &str) -> Result<f64> {
        prices
            .get(id)
            .copied()
            .ok_or_else(|| anyhow!("{} returned no price for {}", self.price_source_name, id))
    }

    async fn evm_quote(
        &self,
        network: Network,
        prices: &HashMap<String, f64>,
    ) -> Result<NetworkQuote, FrameError> {
        let pool = self
            .settings
            .evm_pool(network)
            .ok_or_else(|| FrameError::fetch(network.name(), anyhow!("not an EVM network")))?;
        let paired_usd = self
            .usd_price(prices, &pool.paired_price_id)
            .map_err(|error| FrameError::fetch(self.price_source_name.as_str(), error))?;
        let provider = self.selector.select(network).await?;
        let reserves = fetch_evm_reserves(&provider, pool, paired_usd)
            .await
            .map_err(|error| FrameError::fetch(format!("{} pool", network.label()), error))?;
        NetworkQuote::from_reserves(reserves)
            .map_err(|error| FrameError::fetch(format!("{} pool", network.label()), error))
    }

    async fn osmosis_quote(&self, prices: &HashMap<String, f64>) -> Result<NetworkQuote> {
        let pool = &self.settings.osmosis;
        let paired_usd = self.usd_price(prices, &pool.paired_price_id)?;
        let reserves = fetch_osmosis_reserves(&self.client, pool, paired_usd).await?;
        NetworkQuote::from_reserves(reserves)
    }
}

#[async_trait]
impl MarketSource for PageMarket {
    async fn snapshot(&self) -> Result<MarketSnapshot, FrameError> {
        let prices = self.paired_prices().await?;
        let mut snapshot = MarketSnapshot::default();
        for &network in Network::EVM.iter() {
            let quote = self.evm_quote(network, &prices).await?;
            info!(
                "{}: price {:.6}, TVL {:.2}",
                network, quote.price, quote.tvl
            );
            *snapshot.quotes.get_mut(network) = Some(quote);
        }
        match self.osmosis_quote(&prices).await {
            Ok(quote) => {
                info!("osmosis: price {:.6}, TVL {:.2}", quote.price, quote.tvl);
                snapshot.quotes.osmosis = Some(quote);
            }
            Err(error) => warn!("Osmosis quote unavailable: {:#}", error),
        }
        Ok(snapshot)
    }
}
