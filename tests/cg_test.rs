use std::time::Duration;

use pageframes::{cg::CoinGeckoAPI, PriceAPI};

#[tokio::test]
#[ignore]
async fn test_cg() {
    let _ = env_logger::builder().is_test(true).try_init();
    let api =
        CoinGeckoAPI::build("https://api.coingecko.com/api/v3", Duration::from_secs(10)).unwrap();
    assert!(api
        .get_price(&["ethereum", "osmosis"], "usd")
        .await
        .map_err(|e| {
            eprintln!("{:?}", e);
            e
        })
        .is_ok())
}
