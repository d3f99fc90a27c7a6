use serde::{Deserialize, Serialize};

/// One element of the public price-feed contract: the latest quote for a
/// tradable symbol. For crypto pairs the market cap is the 24h quote volume
/// (the best proxy the feed offers); for stocks it is an equally crude
/// price-derived estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerQuote {
    pub symbol: String,
    pub price: f64,
    pub price_change_percent: f64,
    pub market_cap: f64,
    pub volume: f64,
}

/// A single close price in a history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: chrono::DateTime<chrono::Utc>,
    pub price: f64,
}

/// One OHLCV candle in a history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlePoint {
    pub date: chrono::DateTime<chrono::Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl CandlePoint {
    pub fn close_point(&self) -> PricePoint {
        PricePoint {
            date: self.date,
            price: self.close,
        }
    }
}

/// Candle interval for history requests, in the feed's notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KlineInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
    OneWeek,
}

impl KlineInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Self::OneMinute),
            "5m" => Some(Self::FiveMinutes),
            "15m" => Some(Self::FifteenMinutes),
            "30m" => Some(Self::ThirtyMinutes),
            "1h" => Some(Self::OneHour),
            "4h" => Some(Self::FourHours),
            "1d" => Some(Self::OneDay),
            "1w" => Some(Self::OneWeek),
            _ => None,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        match self {
            Self::OneMinute => chrono::Duration::minutes(1),
            Self::FiveMinutes => chrono::Duration::minutes(5),
            Self::FifteenMinutes => chrono::Duration::minutes(15),
            Self::ThirtyMinutes => chrono::Duration::minutes(30),
            Self::OneHour => chrono::Duration::hours(1),
            Self::FourHours => chrono::Duration::hours(4),
            Self::OneDay => chrono::Duration::days(1),
            Self::OneWeek => chrono::Duration::weeks(1),
        }
    }

    /// How many points a line chart requests for this interval.
    pub fn line_points(&self) -> u32 {
        match self {
            Self::OneMinute => 240,
            Self::FiveMinutes => 288,
            Self::FifteenMinutes => 96,
            Self::ThirtyMinutes => 48,
            Self::OneHour => 24,
            Self::FourHours => 42,
            Self::OneDay => 30,
            Self::OneWeek => 52,
        }
    }

    /// How many points a candlestick chart requests. Lower density at 5m so
    /// individual candles stay legible.
    pub fn candle_points(&self) -> u32 {
        match self {
            Self::FiveMinutes => 144,
            other => other.line_points(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_notation_round_trips() {
        for s in ["1m", "5m", "15m", "30m", "1h", "4h", "1d", "1w"] {
            assert_eq!(KlineInterval::parse(s).unwrap().as_str(), s);
        }
        assert!(KlineInterval::parse("2h").is_none());
    }

    #[test]
    fn durations_match_the_notation() {
        assert_eq!(KlineInterval::OneMinute.duration().num_seconds(), 60);
        assert_eq!(KlineInterval::OneDay.duration().num_hours(), 24);
        assert_eq!(KlineInterval::OneWeek.duration().num_days(), 7);
    }
}
