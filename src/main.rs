use std::sync::Arc;

use tracing::{info, warn};

use neurocrypt_core::config::AppConfig;
use neurocrypt_core::external::binance::BinanceProvider;
use neurocrypt_core::external::fallback::FallbackProvider;
use neurocrypt_core::external::finnhub::FinnhubProvider;
use neurocrypt_core::external::market_provider::MarketDataProvider;
use neurocrypt_core::external::offline::OfflineProvider;
use neurocrypt_core::external::profile_store::ProfileStoreClient;
use neurocrypt_core::logging::{init_logging, LoggingConfig};
use neurocrypt_core::services::price_book::PriceBook;
use neurocrypt_core::services::refresh_scheduler::{JobContext, RefreshScheduler};
use neurocrypt_core::services::simulator_service::{LoadOutcome, SimulatorService};
use neurocrypt_core::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env()).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;
    config.validate().map_err(anyhow::Error::msg)?;

    // Market provider selection mirrors the UI's behavior: Binance first,
    // canned offline data when the live feed is unreachable.
    let market: Arc<dyn MarketDataProvider> = match config.market_provider.to_lowercase().as_str()
    {
        "binance" => {
            info!("📊 Using market provider: Binance only");
            Arc::new(BinanceProvider::new())
        }
        "finnhub" => {
            info!("📊 Using market provider: Finnhub only");
            Arc::new(FinnhubProvider::from_env()?)
        }
        "offline" => {
            info!("📊 Using market provider: offline synthetic data");
            Arc::new(OfflineProvider::new())
        }
        "multi" => {
            info!("📊 Using market provider: Binance with offline fallback");
            Arc::new(FallbackProvider::new(
                Box::new(BinanceProvider::new()),
                Box::new(OfflineProvider::new()),
            ))
        }
        other => anyhow::bail!(
            "Invalid MARKET_PROVIDER: {}. Must be 'binance', 'finnhub', 'offline', or 'multi'",
            other
        ),
    };

    let stocks = config
        .finnhub_api_key
        .as_ref()
        .map(|key| Arc::new(FinnhubProvider::new(key.clone())));

    let session = Session::new(config.auth_token.clone());
    let store = Arc::new(ProfileStoreClient::new(config.backend_url.as_str()));
    let simulator = Arc::new(SimulatorService::new(store, session));

    // The persistence gate opens here; no save can fire before this resolves.
    match simulator.load().await {
        LoadOutcome::Restored => info!("simulator state restored from profile store"),
        LoadOutcome::Fresh => info!("no saved simulator state, starting with defaults"),
        LoadOutcome::Corrupt(e) => {
            warn!("saved simulator state unreadable ({}), starting with defaults", e)
        }
        LoadOutcome::Unavailable(e) => {
            warn!("profile store unavailable ({}), starting with defaults", e)
        }
    }

    let context = JobContext {
        market,
        stocks,
        price_book: Arc::new(PriceBook::new()),
        simulator: simulator.clone(),
    };
    let mut scheduler = RefreshScheduler::new(context).await?;
    scheduler.start().await?;

    info!("🚀 NeuroCrypt simulator engine running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    // Teardown: stop polling, then flush the last state — the headless
    // counterpart of the page-hide save.
    scheduler.shutdown().await?;
    simulator.persist().await;
    info!("👋 Shut down cleanly");

    Ok(())
}
