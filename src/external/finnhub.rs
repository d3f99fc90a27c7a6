use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::external::market_provider::{MarketDataError, MarketDataProvider};
use crate::models::{CandlePoint, KlineInterval, TickerQuote};

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

/// The fixed board of large-cap symbols the stock views poll.
pub const TOP_STOCK_SYMBOLS: [&str; 20] = [
    "AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "META", "NVDA", "NFLX", "AMD", "INTC", "JPM", "JNJ",
    "V", "PG", "UNH", "HD", "MA", "DIS", "PYPL", "BAC",
];

pub struct FinnhubProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinnhubProvider {
    pub fn from_env() -> Result<Self, MarketDataError> {
        let api_key = std::env::var("FINNHUB_API_KEY")
            .map_err(|_| MarketDataError::BadResponse("FINNHUB_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new(api_key)
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::UNAUTHORIZED => {
                return Err(MarketDataError::BadResponse(
                    "API authentication failed".to_string(),
                ))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(MarketDataError::RateLimited),
            status if !status.is_success() => {
                return Err(MarketDataError::BadResponse(format!("HTTP {status}")))
            }
            _ => {}
        }

        resp.json()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))
    }

    /// Latest quote for one stock symbol.
    pub async fn fetch_quote(&self, symbol: &str) -> Result<TickerQuote, MarketDataError> {
        let quote: FinnhubQuote = self.get_json("quote", &[("symbol", symbol)]).await?;
        quote_to_ticker(symbol, quote)
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// Current price.
    c: f64,
    /// Change percent.
    #[serde(default)]
    dp: Option<f64>,
    /// Volume.
    #[serde(default)]
    v: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FinnhubCandles {
    s: String,
    #[serde(default)]
    t: Option<Vec<i64>>,
    #[serde(default)]
    o: Option<Vec<f64>>,
    #[serde(default)]
    h: Option<Vec<f64>>,
    #[serde(default)]
    l: Option<Vec<f64>>,
    #[serde(default)]
    c: Option<Vec<f64>>,
    #[serde(default)]
    v: Option<Vec<f64>>,
}

fn quote_to_ticker(symbol: &str, quote: FinnhubQuote) -> Result<TickerQuote, MarketDataError> {
    // Finnhub reports unknown symbols as an all-zero quote.
    if quote.c == 0.0 {
        return Err(MarketDataError::BadResponse(format!(
            "no quote data for {symbol}"
        )));
    }
    Ok(TickerQuote {
        symbol: symbol.to_string(),
        price: quote.c,
        price_change_percent: quote.dp.unwrap_or(0.0),
        // The quote endpoint carries no market cap; a price-derived estimate
        // keeps the board sortable.
        market_cap: quote.c * 1_000_000.0,
        volume: quote.v.unwrap_or(0.0),
    })
}

fn resolution_for(interval: KlineInterval) -> &'static str {
    match interval {
        KlineInterval::OneMinute => "1",
        KlineInterval::FiveMinutes => "5",
        KlineInterval::FifteenMinutes => "15",
        KlineInterval::ThirtyMinutes => "30",
        KlineInterval::OneHour | KlineInterval::FourHours => "60",
        KlineInterval::OneDay => "D",
        KlineInterval::OneWeek => "W",
    }
}

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    async fn fetch_top_tickers(&self) -> Result<Vec<TickerQuote>, MarketDataError> {
        let mut quotes = Vec::new();
        for symbol in TOP_STOCK_SYMBOLS {
            match self.fetch_quote(symbol).await {
                Ok(quote) => quotes.push(quote),
                Err(MarketDataError::RateLimited) => return Err(MarketDataError::RateLimited),
                Err(e) => warn!("failed to fetch quote for {}: {}", symbol, e),
            }
        }

        if quotes.is_empty() {
            return Err(MarketDataError::BadResponse(
                "no stock data available".to_string(),
            ));
        }
        Ok(quotes)
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        Ok(self.fetch_quote(symbol).await?.price)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: u32,
    ) -> Result<Vec<CandlePoint>, MarketDataError> {
        let to = chrono::Utc::now().timestamp();
        let from = to - i64::from(limit) * interval.duration().num_seconds();

        let candles: FinnhubCandles = self
            .get_json(
                "stock/candle",
                &[
                    ("symbol", symbol),
                    ("resolution", resolution_for(interval)),
                    ("from", &from.to_string()),
                    ("to", &to.to_string()),
                ],
            )
            .await?;

        if candles.s != "ok" {
            return Err(MarketDataError::BadResponse(format!(
                "candle status {} for {}",
                candles.s, symbol
            )));
        }

        let (t, o, h, l, c) = match (candles.t, candles.o, candles.h, candles.l, candles.c) {
            (Some(t), Some(o), Some(h), Some(l), Some(c)) => (t, o, h, l, c),
            _ => {
                return Err(MarketDataError::BadResponse(format!(
                    "missing candle arrays for {symbol}"
                )))
            }
        };
        let v = candles.v.unwrap_or_default();

        let mut points = Vec::with_capacity(t.len());
        for i in 0..t.len() {
            let Some(date) = chrono::DateTime::from_timestamp(t[i], 0) else {
                continue;
            };
            let (Some(&open), Some(&high), Some(&low), Some(&close)) =
                (o.get(i), h.get(i), l.get(i), c.get(i))
            else {
                continue;
            };
            points.push(CandlePoint {
                date,
                open,
                high,
                low,
                close,
                volume: v.get(i).copied().unwrap_or(0.0),
            });
        }

        Ok(points)
    }
}
