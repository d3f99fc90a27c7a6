use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CandlePoint, KlineInterval, TickerQuote};

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest quotes for the top tradable symbols, most liquid first.
    async fn fetch_top_tickers(&self) -> Result<Vec<TickerQuote>, MarketDataError>;

    /// Latest price for a single symbol.
    async fn fetch_price(&self, symbol: &str) -> Result<f64, MarketDataError>;

    /// Historical candles for a symbol, oldest first.
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u32,
    ) -> Result<Vec<CandlePoint>, MarketDataError>;
}
