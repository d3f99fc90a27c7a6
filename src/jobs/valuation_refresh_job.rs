use std::collections::HashSet;

use futures::future::join_all;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::services::refresh_scheduler::{JobContext, JobResult};

/// One tick of the valuation refresh loop.
///
/// Pulls the top tradable tickers into the price book, tops up prices for
/// held symbols the batch missed, then revalues open positions against the
/// refreshed book.
pub async fn run_valuation_refresh(ctx: JobContext) -> Result<JobResult, AppError> {
    let tickers = ctx.market.fetch_top_tickers().await?;
    let batch: HashSet<String> = tickers.iter().map(|t| t.symbol.clone()).collect();
    let fetched = tickers.len();
    ctx.price_book.update(tickers);

    // Held symbols can drop out of the top list; fetch those individually so
    // open positions keep revaluing instead of going stale.
    let missing: Vec<String> = ctx
        .simulator
        .snapshot()
        .held_symbols()
        .into_iter()
        .filter(|symbol| !batch.contains(symbol))
        .collect();

    let mut looked_up = 0;
    let mut failed = 0;
    let lookups = missing.into_iter().map(|symbol| {
        let market = ctx.market.clone();
        async move {
            let result = market.fetch_price(&symbol).await;
            (symbol, result)
        }
    });
    for (symbol, result) in join_all(lookups).await {
        match result {
            Ok(price) => {
                ctx.price_book.upsert_price(&symbol, price);
                looked_up += 1;
            }
            Err(e) => {
                warn!("price lookup failed for held symbol {}: {}", symbol, e);
                failed += 1;
            }
        }
    }

    let revalued = ctx
        .simulator
        .refresh_valuations(&ctx.price_book.price_map())
        .await;

    info!(
        "refreshed {} tickers ({} held-symbol lookups), revalued {} positions",
        fetched, looked_up, revalued
    );

    Ok(JobResult {
        items_processed: (fetched + looked_up) as i32,
        items_failed: failed,
    })
}
