use async_trait::async_trait;
use dashmap::DashMap;

use crate::external::market_provider::{MarketDataError, MarketDataProvider};
use crate::models::{CandlePoint, KlineInterval, TickerQuote};

/// Canned baseline quotes, used when the real feed is unreachable or
/// geo-restricted. Symbol, price, market cap, volume.
const BASELINE_TICKERS: [(&str, f64, f64, f64); 10] = [
    ("BTCUSDT", 45_000.0, 850_000_000_000.0, 25_000_000_000.0),
    ("ETHUSDT", 3_000.0, 350_000_000_000.0, 15_000_000_000.0),
    ("BNBUSDT", 300.0, 50_000_000_000.0, 8_000_000_000.0),
    ("ADAUSDT", 0.5, 25_000_000_000.0, 5_000_000_000.0),
    ("SOLUSDT", 100.0, 40_000_000_000.0, 6_000_000_000.0),
    ("DOTUSDT", 7.0, 8_000_000_000.0, 2_000_000_000.0),
    ("LINKUSDT", 15.0, 8_000_000_000.0, 1_500_000_000.0),
    ("LTCUSDT", 70.0, 5_000_000_000.0, 1_000_000_000.0),
    ("BCHUSDT", 250.0, 5_000_000_000.0, 800_000_000.0),
    ("XLMUSDT", 0.1, 2_000_000_000.0, 500_000_000.0),
];

/// Synthetic market data provider. Prices random-walk around the canned
/// baselines so valuations still move between refresh ticks.
pub struct OfflineProvider {
    prices: DashMap<String, f64>,
}

impl OfflineProvider {
    pub fn new() -> Self {
        Self {
            prices: DashMap::new(),
        }
    }

    fn step(&self, symbol: &str, baseline: f64) -> f64 {
        let mut entry = self.prices.entry(symbol.to_string()).or_insert(baseline);
        *entry *= 1.0 + (rand::random::<f64>() - 0.5) * 0.02;
        *entry
    }
}

impl Default for OfflineProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for OfflineProvider {
    async fn fetch_top_tickers(&self) -> Result<Vec<TickerQuote>, MarketDataError> {
        let quotes = BASELINE_TICKERS
            .iter()
            .map(|&(symbol, baseline, market_cap, volume)| {
                let price = self.step(symbol, baseline);
                TickerQuote {
                    symbol: symbol.to_string(),
                    price,
                    price_change_percent: (price - baseline) / baseline * 100.0,
                    market_cap,
                    volume,
                }
            })
            .collect();
        Ok(quotes)
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        let baseline = BASELINE_TICKERS
            .iter()
            .find(|(s, ..)| *s == symbol)
            .map(|&(_, p, ..)| p)
            .unwrap_or(100.0);
        Ok(self.step(symbol, baseline))
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u32,
    ) -> Result<Vec<CandlePoint>, MarketDataError> {
        let baseline = BASELINE_TICKERS
            .iter()
            .find(|(s, ..)| *s == symbol)
            .map(|&(_, p, ..)| p)
            .unwrap_or(100.0);

        let now = chrono::Utc::now();
        let mut current = baseline;
        let mut points = Vec::with_capacity(limit as usize);

        for i in (0..i64::from(limit)).rev() {
            let open = current;
            current *= 1.0 + (rand::random::<f64>() - 0.5) * 0.02;
            let (high, low) = if open > current {
                (open, current)
            } else {
                (current, open)
            };
            points.push(CandlePoint {
                date: now - interval.duration() * i as i32,
                open,
                high,
                low,
                close: current,
                volume: rand::random::<f64>() * 1_000.0,
            });
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn top_tickers_cover_the_baseline_board() {
        let provider = OfflineProvider::new();
        let quotes = provider.fetch_top_tickers().await.unwrap();

        assert_eq!(quotes.len(), BASELINE_TICKERS.len());
        assert!(quotes.iter().any(|q| q.symbol == "BTCUSDT"));
        assert!(quotes.iter().all(|q| q.price > 0.0));
    }

    #[tokio::test]
    async fn prices_drift_between_fetches() {
        let provider = OfflineProvider::new();
        let first = provider.fetch_price("BTCUSDT").await.unwrap();
        let second = provider.fetch_price("BTCUSDT").await.unwrap();
        // A multiplicative walk never lands exactly on the same price.
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn history_is_oldest_first_with_the_requested_length() {
        let provider = OfflineProvider::new();
        let candles = provider
            .fetch_history("ETHUSDT", KlineInterval::OneDay, 30)
            .await
            .unwrap();

        assert_eq!(candles.len(), 30);
        assert!(candles.windows(2).all(|w| w[0].date < w[1].date));
        assert!(candles.iter().all(|c| c.low <= c.high));
    }
}
