use std::sync::Arc;

use log::{info, warn};

use crate::{
    error::{EndpointFailure, FrameError},
    network::{Network, PerNetwork},
    rpc::{JsonRpcProvider, RpcTransport},
    settings::Settings,
};

/// Picks the first live JSON-RPC endpoint of a chain.
///
/// Endpoints are tried once each, in configured order, and a provider is live
/// when `eth_blockNumber` answers with a valid quantity. Failures are recorded
/// and only surface when every endpoint of the chain has failed.
pub struct ProviderSelector {
    endpoints: PerNetwork<Vec<String>>,
    transport: Arc<dyn RpcTransport>,
}

impl ProviderSelector {
    pub fn new(endpoints: PerNetwork<Vec<String>>, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            endpoints,
            transport,
        }
    }

    pub fn from_settings(settings: &Settings, transport: Arc<dyn RpcTransport>) -> Self {
        let endpoints = PerNetwork::from_fn(|network| {
            settings
                .evm_pool(network)
                .map(|pool| pool.rpc_urls.clone())
                .unwrap_or_default()
        });
        Self::new(endpoints, transport)
    }

    pub fn endpoints(&self, chain: Network) -> &[String] {
        self.endpoints.get(chain)
    }

    pub async fn select(&self, chain: Network) -> Result<JsonRpcProvider, FrameError> {
        let mut failures = Vec::new();
        for url in self.endpoints(chain) {
            info!("Trying RPC for {}: {}", chain, url);
            let provider = JsonRpcProvider::new(url.as_str(), self.transport.clone());
            match provider.block_number().await {
                Ok(block) => {
                    info!("Connected to {}, block #{}", url, block);
                    if !failures.is_empty() {
                        info!("{} skipped {} failing endpoint(s)", chain, failures.len());
                    }
                    return Ok(provider);
                }
                Err(error) => {
                    warn!("RPC failed for {}: {:#}", url, error);
                    failures.push(EndpointFailure {
                        url: url.clone(),
                        reason: format!("{:#}", error),
                    });
                }
            }
        }
        Err(FrameError::ProviderExhausted { chain, failures })
    }
}
