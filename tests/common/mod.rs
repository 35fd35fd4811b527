#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use pageframes::{
    error::FrameError,
    network::{Network, PerNetwork},
    reserves::{PoolReserves, GET_RESERVES_SELECTOR, TOKEN0_SELECTOR, TOKEN1_SELECTOR},
    rpc::RpcTransport,
    MarketSnapshot, MarketSource, NetworkQuote, PriceAPI,
};
use serde_json::{json, Value};

/// In-memory JSON-RPC endpoints: dead URLs fail, live ones answer
/// `eth_blockNumber` and scripted `eth_call`s.
#[derive(Default)]
pub struct ScriptedTransport {
    dead: HashSet<String>,
    calls: HashMap<String, String>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dead(mut self, url: &str) -> Self {
        self.dead.insert(url.to_owned());
        self
    }

    pub fn answer(mut self, selector: &str, output: String) -> Self {
        self.calls.insert(selector.to_owned(), output);
        self
    }

    /// A V2 pair whose `token0`/`token1` are the given addresses.
    pub fn pair(self, token0: &str, token1: &str, reserve0: u128, reserve1: u128) -> Self {
        self.answer(TOKEN0_SELECTOR, address_word(token0))
            .answer(TOKEN1_SELECTOR, address_word(token1))
            .answer(
                GET_RESERVES_SELECTOR,
                format!("0x{:064x}{:064x}{:064x}", reserve0, reserve1, 1_700_000_000u64),
            )
    }

    pub fn probed(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter(|(_, method)| method == "eth_blockNumber")
            .map(|(url, _)| url.clone())
            .collect()
    }
}

pub fn address_word(address: &str) -> String {
    format!("0x{:0>64}", address.trim_start_matches("0x"))
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn request(&self, url: &str, method: &str, params: Value) -> Result<Value> {
        self.requests
            .lock()
            .push((url.to_owned(), method.to_owned()));
        if self.dead.contains(url) {
            bail!("connection refused");
        }
        match method {
            "eth_blockNumber" => Ok(json!("0x1312d00")),
            "eth_call" => {
                let data = params[0]["data"]
                    .as_str()
                    .ok_or_else(|| anyhow!("eth_call without data"))?;
                self.calls
                    .get(data)
                    .map(|output| json!(output))
                    .ok_or_else(|| anyhow!("execution reverted"))
            }
            other => bail!("method {} not found", other),
        }
    }
}

/// Fixed USD prices by CoinGecko id; remembers every requested batch.
pub struct FixedPrices {
    prices: HashMap<String, f64>,
    pub batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FixedPrices {
    pub fn new(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(id, price)| (id.to_string(), *price))
                .collect(),
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl PriceAPI for FixedPrices {
    async fn get_price(&self, id_list: &[&str], _: &str) -> Result<Vec<(String, f64)>> {
        self.batches
            .lock()
            .push(id_list.iter().map(|id| id.to_string()).collect());
        id_list
            .iter()
            .map(|id| {
                self.prices
                    .get(*id)
                    .map(|price| (id.to_string(), *price))
                    .ok_or_else(|| anyhow!("no price for {}", id))
            })
            .collect()
    }
}

/// A market with the same pool on every network, scaled per network.
pub struct FixedMarket(pub MarketSnapshot);

impl FixedMarket {
    /// PAGE at `price` with `tvl` of liquidity on every network but Osmosis,
    /// which is unavailable when `osmosis` is false.
    pub fn uniform(price: f64, tvl: f64, osmosis: bool) -> Self {
        let quotes = PerNetwork::from_fn(|network| {
            if network == Network::Osmosis && !osmosis {
                return None;
            }
            // half the TVL on each side of a 1:1 priced pair
            let page_amount = tvl / 2.0 / price;
            let reserves = PoolReserves::constant_product(page_amount, tvl / 2.0, 1.0);
            Some(NetworkQuote {
                price,
                tvl,
                reserves,
            })
        });
        Self(MarketSnapshot { quotes })
    }
}

#[async_trait]
impl MarketSource for FixedMarket {
    async fn snapshot(&self) -> Result<MarketSnapshot, FrameError> {
        Ok(self.0)
    }
}

pub struct BrokenMarket;

#[async_trait]
impl MarketSource for BrokenMarket {
    async fn snapshot(&self) -> Result<MarketSnapshot, FrameError> {
        Err(FrameError::ProviderExhausted {
            chain: Network::Ethereum,
            failures: Vec::new(),
        })
    }
}
