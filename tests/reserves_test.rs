mod common;

use std::sync::Arc;

use common::ScriptedTransport;
use pageframes::{reserves::fetch_evm_reserves, rpc::JsonRpcProvider, settings::EvmPool};

const PAGE: &str = "0x60e683c6514edd5f758a55b6f393bebbafaa8d5e";
const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

fn pool() -> EvmPool {
    EvmPool {
        rpc_urls: vec!["https://rpc".to_owned()],
        pool: "0x9a0cc6791a5409ce3547f1f1d00e058c79d0a72c".to_owned(),
        // mixed case as copied from an explorer
        page_token: "0x60E683C6514Edd5F758A55b6f393BEBBAfaA8d5e".to_owned(),
        page_decimals: 8,
        paired_decimals: 18,
        paired_price_id: "ethereum".to_owned(),
        dex_url: String::new(),
    }
}

#[tokio::test]
async fn page_as_token0() {
    // 1,000,000 PAGE / 10 WETH
    let transport = ScriptedTransport::new().pair(
        PAGE,
        WETH,
        100_000_000_000_000,
        10_000_000_000_000_000_000,
    );
    let provider = JsonRpcProvider::new("https://rpc", Arc::new(transport));

    let reserves = fetch_evm_reserves(&provider, &pool(), 3000.0).await.unwrap();
    assert_eq!(reserves.page_amount, 1_000_000.0);
    assert_eq!(reserves.paired_amount, 10.0);
    assert!((reserves.spot_price().unwrap() - 0.03).abs() < 1e-12);
}

#[tokio::test]
async fn page_as_token1() {
    let transport = ScriptedTransport::new().pair(
        WETH,
        PAGE,
        10_000_000_000_000_000_000,
        100_000_000_000_000,
    );
    let provider = JsonRpcProvider::new("https://rpc", Arc::new(transport));

    let reserves = fetch_evm_reserves(&provider, &pool(), 3000.0).await.unwrap();
    assert_eq!(reserves.page_amount, 1_000_000.0);
    assert_eq!(reserves.paired_amount, 10.0);
}

#[tokio::test]
async fn pool_without_page_is_rejected() {
    let transport = ScriptedTransport::new().pair(
        WETH,
        "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
        1,
        1,
    );
    let provider = JsonRpcProvider::new("https://rpc", Arc::new(transport));

    let error = fetch_evm_reserves(&provider, &pool(), 3000.0)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("neither is PAGE"));
}

#[tokio::test]
async fn reverted_call_is_an_error() {
    let transport = ScriptedTransport::new();
    let provider = JsonRpcProvider::new("https://rpc", Arc::new(transport));
    assert!(fetch_evm_reserves(&provider, &pool(), 3000.0).await.is_err());
}
