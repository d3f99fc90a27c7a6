mod account;
mod market;
mod position;
mod transaction;

pub use account::{Account, DEFAULT_INITIAL_BALANCE};
pub use market::{CandlePoint, KlineInterval, PricePoint, TickerQuote};
pub use position::Position;
pub use transaction::{TradeSide, Transaction};
