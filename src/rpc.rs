use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, ensure, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

/// Sends one JSON-RPC 2.0 request to an endpoint and yields its `result`.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn request(&self, url: &str, method: &str, params: Value) -> Result<Value>;
}

pub struct HttpTransport {
    client: Client,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl HttpTransport {
    pub fn build(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, url: &str, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let res = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let res: RpcResponse = res.json().await?;
        debug!("{} {} answered", url, method);
        match (res.result, res.error) {
            (_, Some(error)) => bail!("RPC error {}: {}", error.code, error.message),
            (Some(result), None) => Ok(result),
            (None, None) => bail!("RPC response carried neither result nor error"),
        }
    }
}

/// A JSON-RPC endpoint bound to a transport.
#[derive(Clone)]
pub struct JsonRpcProvider {
    url: String,
    transport: Arc<dyn RpcTransport>,
}

impl JsonRpcProvider {
    pub fn new(url: impl Into<String>, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn block_number(&self) -> Result<u64> {
        let result = self
            .transport
            .request(&self.url, "eth_blockNumber", json!([]))
            .await?;
        let quantity = result
            .as_str()
            .ok_or_else(|| anyhow!("eth_blockNumber returned {}", result))?;
        parse_quantity(quantity)
    }

    /// `eth_call` against the latest block, returning the raw hex output.
    pub async fn call(&self, to: &str, data: &str) -> Result<String> {
        let result = self
            .transport
            .request(
                &self.url,
                "eth_call",
                json!([{ "to": to, "data": data }, "latest"]),
            )
            .await
            .with_context(|| format!("eth_call {} on {}", data, to))?;
        result
            .as_str()
            .map(|output| output.to_owned())
            .ok_or_else(|| anyhow!("eth_call returned {}", result))
    }
}

/// Parses a hex quantity such as `0x12a05f2`.
pub fn parse_quantity(quantity: &str) -> Result<u64> {
    let digits = strip_hex_prefix(quantity);
    ensure!(!digits.is_empty(), "empty hex quantity");
    u64::from_str_radix(digits, 16).with_context(|| format!("Bad hex quantity {}", quantity))
}

/// Splits ABI-encoded output into 32-byte words.
pub fn abi_words(data: &str) -> Result<Vec<&str>> {
    let digits = strip_hex_prefix(data);
    ensure!(
        digits.len() % 64 == 0,
        "ABI output length {} is not a whole number of words",
        digits.len()
    );
    ensure!(
        digits.bytes().all(|b| b.is_ascii_hexdigit()),
        "ABI output is not hex"
    );
    digits
        .as_bytes()
        .chunks(64)
        .map(|chunk| std::str::from_utf8(chunk).map_err(Into::into))
        .collect()
}

/// Reads a `uint` word that must fit in 128 bits.
pub fn word_to_u128(word: &str) -> Result<u128> {
    ensure!(word.len() == 64, "ABI word must be 64 hex digits");
    let (high, low) = word.split_at(32);
    ensure!(
        high.bytes().all(|b| b == b'0'),
        "ABI word {} overflows 128 bits",
        word
    );
    Ok(u128::from_str_radix(low, 16)?)
}

/// Reads an `address` word as lowercase `0x`-prefixed hex.
pub fn word_to_address(word: &str) -> Result<String> {
    ensure!(word.len() == 64, "ABI word must be 64 hex digits");
    Ok(format!("0x{}", word[24..].to_ascii_lowercase()))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
