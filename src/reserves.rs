use anyhow::{anyhow, ensure, Context, Result};
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    rpc::{abi_words, word_to_address, word_to_u128, JsonRpcProvider},
    settings::{EvmPool, OsmosisPool},
};

pub const TOKEN0_SELECTOR: &str = "0x0dfe1681";
pub const TOKEN1_SELECTOR: &str = "0xd21220a7";
pub const GET_RESERVES_SELECTOR: &str = "0x0902f1ac";

/// Decimal-adjusted pool balances plus the paired asset's USD price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolReserves {
    pub page_amount: f64,
    pub paired_amount: f64,
    pub paired_usd: f64,
    pub page_weight: f64,
    pub paired_weight: f64,
}

impl PoolReserves {
    /// Balances of an equal-weight constant-product pool.
    pub fn constant_product(page_amount: f64, paired_amount: f64, paired_usd: f64) -> Self {
        Self {
            page_amount,
            paired_amount,
            paired_usd,
            page_weight: 1.0,
            paired_weight: 1.0,
        }
    }

    /// PAGE price in USD implied by the pool.
    pub fn spot_price(&self) -> Result<f64> {
        ensure!(self.page_amount > 0.0, "pool holds no PAGE");
        ensure!(
            self.page_weight > 0.0 && self.paired_weight > 0.0,
            "pool weights must be positive"
        );
        let paired_per_page =
            (self.paired_amount / self.paired_weight) / (self.page_amount / self.page_weight);
        Ok(paired_per_page * self.paired_usd)
    }

    /// USD value of both sides at the given PAGE price.
    pub fn tvl(&self, page_price: f64) -> f64 {
        self.page_amount * page_price + self.paired_amount * self.paired_usd
    }
}

fn scale(raw: u128, decimals: u32) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

async fn call_address(provider: &JsonRpcProvider, to: &str, selector: &str) -> Result<String> {
    let output = provider.call(to, selector).await?;
    let words = abi_words(&output)?;
    let word = words
        .first()
        .ok_or_else(|| anyhow!("empty output for {} on {}", selector, to))?;
    word_to_address(word)
}

/// Reads a Uniswap-V2 style pair through `token0()`, `token1()` and
/// `getReserves()`.
pub async fn fetch_evm_reserves(
    provider: &JsonRpcProvider,
    pool: &EvmPool,
    paired_usd: f64,
) -> Result<PoolReserves> {
    let token0 = call_address(provider, &pool.pool, TOKEN0_SELECTOR).await?;
    let token1 = call_address(provider, &pool.pool, TOKEN1_SELECTOR).await?;
    let output = provider.call(&pool.pool, GET_RESERVES_SELECTOR).await?;
    let words = abi_words(&output)?;
    ensure!(words.len() >= 2, "getReserves returned {} words", words.len());
    let reserve0 = word_to_u128(words[0])?;
    let reserve1 = word_to_u128(words[1])?;
    debug!(
        "{} via {}: token0 {} = {}, token1 {} = {}",
        pool.pool,
        provider.url(),
        token0,
        reserve0,
        token1,
        reserve1
    );

    let page_token = pool.page_token.to_ascii_lowercase();
    let (page_raw, paired_raw) = if token0 == page_token {
        (reserve0, reserve1)
    } else if token1 == page_token {
        (reserve1, reserve0)
    } else {
        return Err(anyhow!(
            "pool {} pairs {} and {}, neither is PAGE {}",
            pool.pool,
            token0,
            token1,
            page_token
        ));
    };
    Ok(PoolReserves::constant_product(
        scale(page_raw, pool.page_decimals),
        scale(paired_raw, pool.paired_decimals),
        paired_usd,
    ))
}

#[derive(Debug, Deserialize)]
pub struct OsmosisPoolResponse {
    pub pool: OsmosisPoolBody,
}

#[derive(Debug, Deserialize)]
pub struct OsmosisPoolBody {
    pub pool_assets: Vec<OsmosisPoolAsset>,
}

#[derive(Debug, Deserialize)]
pub struct OsmosisPoolAsset {
    pub token: OsmosisCoin,
    pub weight: String,
}

#[derive(Debug, Deserialize)]
pub struct OsmosisCoin {
    pub denom: String,
    pub amount: String,
}

/// Reads a GAMM weighted pool from an Osmosis LCD endpoint.
pub async fn fetch_osmosis_reserves(
    client: &Client,
    pool: &OsmosisPool,
    paired_usd: f64,
) -> Result<PoolReserves> {
    let url = format!(
        "{}/osmosis/gamm/v1beta1/pools/{}",
        pool.lcd_url.trim_end_matches('/'),
        pool.pool_id
    );
    let res = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Requesting {}", url))?
        .error_for_status()?;
    let body: OsmosisPoolResponse = res.json().await.context("Decoding Osmosis pool")?;
    osmosis_reserves(&body, pool, paired_usd)
}

pub fn osmosis_reserves(
    body: &OsmosisPoolResponse,
    pool: &OsmosisPool,
    paired_usd: f64,
) -> Result<PoolReserves> {
    let find = |denom: &str| {
        body.pool
            .pool_assets
            .iter()
            .find(|asset| asset.token.denom == denom)
            .ok_or_else(|| anyhow!("pool {} has no {} asset", pool.pool_id, denom))
    };
    let page = find(&pool.page_denom)?;
    let paired = find(&pool.paired_denom)?;
    let amount = |asset: &OsmosisPoolAsset, decimals: u32| -> Result<f64> {
        let raw: u128 = asset
            .token
            .amount
            .parse()
            .with_context(|| format!("Bad amount {}", asset.token.amount))?;
        Ok(scale(raw, decimals))
    };
    let weight = |asset: &OsmosisPoolAsset| -> Result<f64> {
        asset
            .weight
            .parse()
            .with_context(|| format!("Bad weight {}", asset.weight))
    };
    Ok(PoolReserves {
        page_amount: amount(page, pool.page_decimals)?,
        paired_amount: amount(paired, pool.paired_decimals)?,
        paired_usd,
        page_weight: weight(page)?,
        paired_weight: weight(paired)?,
    })
}
