pub mod cg;
pub mod error;
pub mod frame;
pub mod html;
pub mod market;
pub mod network;
pub mod provider;
pub mod reserves;
pub mod rpc;
pub mod server;
pub mod settings;
pub mod state;
pub mod svg;
pub mod weighting;

use anyhow::{bail, Result};
use async_trait::async_trait;

pub use error::FrameError;
pub use market::{MarketSnapshot, NetworkQuote};

#[async_trait]
pub trait PriceAPI {
    async fn get_price(&self, id_list: &[&str], in_currency: &str) -> Result<Vec<(String, f64)>>;
}

pub struct UnsupportedAPI {}

#[async_trait]
impl PriceAPI for UnsupportedAPI {
    async fn get_price(&self, _: &[&str], _: &str) -> Result<Vec<(String, f64)>> {
        bail!("Unsupported API")
    }
}

pub trait NamedAPI {
    fn get_name(&self) -> String;
}

/// Where frames get their market data; fetched fresh on every call.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn snapshot(&self) -> Result<MarketSnapshot, FrameError>;
}
