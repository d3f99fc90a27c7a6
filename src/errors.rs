use thiserror::Error;

use crate::external::market_provider::MarketDataError;
use crate::external::profile_store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Profile store error: {0}")]
    Store(#[from] StoreError),
    #[error("Market data error: {0}")]
    Market(#[from] MarketDataError),
    #[error("External error: {0}")]
    External(String),
}
