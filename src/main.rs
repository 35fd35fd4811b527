use anyhow::{Context, Result};
use pageframes::{
    frame::FrameResponder, market::PageMarket, server::routes, settings::Settings,
};
use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    log::info!("Starting PAGE frames...");

    let settings = Arc::new(Settings::load().context("Loading settings")?);
    let addr: SocketAddr = settings
        .bind_address
        .parse()
        .with_context(|| format!("Parsing bind address {}", settings.bind_address))?;
    let market = PageMarket::from_settings(settings.clone()).context("Building market client")?;
    let responder = Arc::new(FrameResponder::new(settings.clone(), Arc::new(market)));

    log::info!("Serving {} on {}", settings.frame_url(), addr);
    warp::serve(routes(responder)).run(addr).await;
    Ok(())
}
