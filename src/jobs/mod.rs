//! Background Jobs Module
//!
//! Periodic work driven by the refresh scheduler, independent of any user
//! action:
//!
//! - `valuation_refresh_job` - Polls the market feed and revalues open positions
//! - `stock_quote_refresh_job` - Polls the fixed stock board into the price book
//!
//! Jobs are idempotent and fault-tolerant: a failed tick is logged and the
//! next tick simply retries. There is no backoff and no sequencing of
//! overlapping runs; the latest fetch to resolve wins.

pub mod stock_quote_refresh_job;
pub mod valuation_refresh_job;
