use std::time::Duration;

use crate::{NamedAPI, PriceAPI};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::info;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::Value;

/// Paired-asset USD prices from CoinGecko's simple-price endpoint.
pub struct CoinGeckoAPI {
    client: Client,
    base_url: String,
}

impl CoinGeckoAPI {
    pub fn build(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Accepts", HeaderValue::from_static("application/json"));
        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(timeout)
                .build()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl PriceAPI for CoinGeckoAPI {
    async fn get_price(&self, id_list: &[&str], in_currency: &str) -> Result<Vec<(String, f64)>> {
        let builder = self
            .client
            .get(&format!("{}/simple/price", self.base_url));
        let res = builder
            .query(&[
                ("ids", id_list.join(",").as_str()),
                ("vs_currencies", in_currency),
            ])
            .send()
            .await
            .context("CoinGecko request failed")?
            .error_for_status()?;
        let res: Value = res.json().await?;
        info!("CoinGecko response {:?}", res);
        parse_simple_price(&res, id_list, in_currency)
    }
}

impl NamedAPI for CoinGeckoAPI {
    fn get_name(&self) -> String {
        "CoinGecko".to_owned()
    }
}

/*
{
  "ethereum": { "usd": 3150.12 },
  "osmosis": { "usd": 0.41 }
}
*/
fn parse_simple_price(
    res: &Value,
    id_list: &[&str],
    in_currency: &str,
) -> Result<Vec<(String, f64)>> {
    id_list
        .iter()
        .map(|id| {
            res[id][in_currency]
                .as_f64()
                .map(|price| (id.to_string(), price))
                .ok_or_else(|| anyhow!("Cannot parse CoinGecko price for {}", id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_requested_id() {
        let res = json!({ "ethereum": { "usd": 3150.5 }, "osmosis": { "usd": 0.4 } });
        let prices = parse_simple_price(&res, &["ethereum", "osmosis"], "usd").unwrap();
        assert_eq!(
            prices,
            vec![("ethereum".to_owned(), 3150.5), ("osmosis".to_owned(), 0.4)]
        );
    }

    #[test]
    fn missing_id_is_an_error() {
        let res = json!({ "ethereum": { "usd": 3150.5 } });
        assert!(parse_simple_price(&res, &["ethereum", "osmosis"], "usd").is_err());
    }
}
