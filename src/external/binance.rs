use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::external::market_provider::{MarketDataError, MarketDataProvider};
use crate::models::{CandlePoint, KlineInterval, TickerQuote};

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const TOP_TICKER_COUNT: usize = 50;
const HISTORY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub struct BinanceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Binance24hrTicker {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    quote_volume: String,
    volume: String,
}

#[derive(Debug, Deserialize)]
struct BinanceTickerPrice {
    price: String,
}

/// Keep USDT pairs, rank by 24h quote volume and cut to the top N. Quote
/// volume stands in for market cap; the feed offers nothing closer.
fn shape_top_tickers(raw: Vec<Binance24hrTicker>) -> Vec<TickerQuote> {
    let mut quotes: Vec<TickerQuote> = raw
        .into_iter()
        .filter(|t| t.symbol.ends_with("USDT"))
        .filter_map(|t| {
            Some(TickerQuote {
                price: t.last_price.parse().ok()?,
                price_change_percent: t.price_change_percent.parse().ok()?,
                market_cap: t.quote_volume.parse().ok()?,
                volume: t.volume.parse().ok()?,
                symbol: t.symbol,
            })
        })
        .collect();

    quotes.sort_by(|a, b| {
        b.market_cap
            .partial_cmp(&a.market_cap)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    quotes.truncate(TOP_TICKER_COUNT);
    quotes
}

/// A kline row is a heterogeneous array: open time in ms, then OHLCV as
/// strings. Rows that don't match are dropped.
fn parse_kline_row(row: &[Value]) -> Option<CandlePoint> {
    if row.len() < 6 {
        return None;
    }
    let date = chrono::DateTime::from_timestamp_millis(row[0].as_i64()?)?;
    let field = |i: usize| row[i].as_str()?.parse::<f64>().ok();

    Some(CandlePoint {
        date,
        open: field(1)?,
        high: field(2)?,
        low: field(3)?,
        close: field(4)?,
        volume: field(5)?,
    })
}

#[async_trait]
impl MarketDataProvider for BinanceProvider {
    async fn fetch_top_tickers(&self) -> Result<Vec<TickerQuote>, MarketDataError> {
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(MarketDataError::BadResponse(format!(
                "HTTP {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        // Geo-restricted regions get an error object instead of the array.
        if !body.is_array() {
            let msg = body
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("unexpected non-array response");
            if msg.contains("restricted location") {
                return Err(MarketDataError::BadResponse(
                    "Binance API restricted in this location".to_string(),
                ));
            }
            return Err(MarketDataError::BadResponse(msg.to_string()));
        }

        let raw: Vec<Binance24hrTicker> =
            serde_json::from_value(body).map_err(|e| MarketDataError::Parse(e.to_string()))?;

        Ok(shape_top_tickers(raw))
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketDataError::BadResponse(format!(
                "HTTP {} for {}",
                resp.status(),
                symbol
            )));
        }

        let body: BinanceTickerPrice = resp
            .json()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        body.price
            .parse()
            .map_err(|_| MarketDataError::Parse(format!("unparsable price for {symbol}")))
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u32,
    ) -> Result<Vec<CandlePoint>, MarketDataError> {
        let url = format!("{}/api/v3/klines", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("limit", &limit.to_string()),
            ])
            .timeout(HISTORY_TIMEOUT)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketDataError::BadResponse(format!(
                "HTTP {} for {} history",
                resp.status(),
                symbol
            )));
        }

        let rows: Vec<Vec<Value>> = resp
            .json()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        Ok(rows.iter().filter_map(|r| parse_kline_row(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_ticker(symbol: &str, price: &str, quote_volume: &str) -> Binance24hrTicker {
        Binance24hrTicker {
            symbol: symbol.to_string(),
            last_price: price.to_string(),
            price_change_percent: "1.5".to_string(),
            quote_volume: quote_volume.to_string(),
            volume: "1000".to_string(),
        }
    }

    #[test]
    fn shaping_keeps_usdt_pairs_sorted_by_quote_volume() {
        let shaped = shape_top_tickers(vec![
            raw_ticker("ETHUSDT", "3000", "200"),
            raw_ticker("BTCEUR", "42000", "900"),
            raw_ticker("BTCUSDT", "45000", "800"),
            raw_ticker("ADAUSDT", "0.5", "50"),
        ]);

        let symbols: Vec<&str> = shaped.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "ADAUSDT"]);
        assert_eq!(shaped[0].price, 45_000.0);
    }

    #[test]
    fn shaping_drops_unparsable_rows() {
        let shaped = shape_top_tickers(vec![
            raw_ticker("BTCUSDT", "not-a-number", "800"),
            raw_ticker("ETHUSDT", "3000", "200"),
        ]);

        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].symbol, "ETHUSDT");
    }

    #[test]
    fn kline_rows_parse_into_candles() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(
            r#"[
                [1700000000000, "100.0", "110.0", "95.0", "105.0", "12.5", 1700000059999],
                [1700000060000, "105.0", "106.0"]
            ]"#,
        )
        .unwrap();

        let candles: Vec<CandlePoint> = rows.iter().filter_map(|r| parse_kline_row(r)).collect();

        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[0].volume, 12.5);
        assert_eq!(candles[0].date.timestamp_millis(), 1_700_000_000_000);
    }
}
