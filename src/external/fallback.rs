use async_trait::async_trait;
use tracing::warn;

use crate::external::market_provider::{MarketDataError, MarketDataProvider};
use crate::models::{CandlePoint, KlineInterval, TickerQuote};

/// Tries the primary feed first and drops to the fallback when it fails,
/// so the simulator keeps receiving prices when the live feed is down or
/// geo-restricted.
pub struct FallbackProvider {
    primary: Box<dyn MarketDataProvider>,
    fallback: Box<dyn MarketDataProvider>,
}

impl FallbackProvider {
    pub fn new(primary: Box<dyn MarketDataProvider>, fallback: Box<dyn MarketDataProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl MarketDataProvider for FallbackProvider {
    async fn fetch_top_tickers(&self) -> Result<Vec<TickerQuote>, MarketDataError> {
        match self.primary.fetch_top_tickers().await {
            Ok(quotes) => Ok(quotes),
            Err(e) => {
                warn!("primary feed unavailable ({}), using fallback data", e);
                self.fallback.fetch_top_tickers().await
            }
        }
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        match self.primary.fetch_price(symbol).await {
            Ok(price) => Ok(price),
            Err(e) => {
                warn!("primary price lookup failed for {} ({}), using fallback", symbol, e);
                self.fallback.fetch_price(symbol).await
            }
        }
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u32,
    ) -> Result<Vec<CandlePoint>, MarketDataError> {
        match self.primary.fetch_history(symbol, interval, limit).await {
            Ok(candles) => Ok(candles),
            Err(e) => {
                warn!("primary history fetch failed for {} ({}), using fallback", symbol, e);
                self.fallback.fetch_history(symbol, interval, limit).await
            }
        }
    }
}
