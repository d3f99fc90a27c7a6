use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::models::TickerQuote;

/// Thread-safe cache of the latest quote per symbol, shared between the
/// refresh jobs and the simulator. Writes are last-write-wins: whichever
/// fetch resolves last determines the visible price.
#[derive(Clone)]
pub struct PriceBook {
    quotes: Arc<DashMap<String, TickerQuote>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self {
            quotes: Arc::new(DashMap::new()),
        }
    }

    pub fn insert(&self, quote: TickerQuote) {
        self.quotes.insert(quote.symbol.clone(), quote);
    }

    pub fn update(&self, quotes: Vec<TickerQuote>) {
        for quote in quotes {
            self.insert(quote);
        }
    }

    /// Update just the price for a symbol, keeping whatever 24h stats were
    /// already cached. Used for held symbols outside the top list, where
    /// only a bare price lookup is available.
    pub fn upsert_price(&self, symbol: &str, price: f64) {
        self.quotes
            .entry(symbol.to_string())
            .and_modify(|q| q.price = price)
            .or_insert_with(|| TickerQuote {
                symbol: symbol.to_string(),
                price,
                price_change_percent: 0.0,
                market_cap: 0.0,
                volume: 0.0,
            });
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.quotes.get(symbol).map(|q| q.price)
    }

    pub fn quote(&self, symbol: &str) -> Option<TickerQuote> {
        self.quotes.get(symbol).map(|q| q.value().clone())
    }

    /// Snapshot of every cached price, for a valuation pass.
    pub fn price_map(&self) -> HashMap<String, f64> {
        self.quotes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().price))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl Default for PriceBook {
    fn default() -> Self {
        Self::new()
    }
}
