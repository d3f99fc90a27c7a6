pub mod binance;
pub mod fallback;
pub mod finnhub;
pub mod market_provider;
pub mod offline;
pub mod profile_store;
