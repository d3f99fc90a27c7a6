use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::finnhub;
use crate::services::refresh_scheduler::{JobContext, JobResult};

// Delay between quote requests to stay under the provider rate limit.
const INTER_TICKER_DELAY_MS: u64 = 250;

/// One tick of the stock board refresh: polls the fixed top-stock symbols
/// into the shared price book, one request at a time.
pub async fn run_stock_quote_refresh(ctx: JobContext) -> Result<JobResult, AppError> {
    let Some(stocks) = ctx.stocks.as_ref() else {
        return Ok(JobResult {
            items_processed: 0,
            items_failed: 0,
        });
    };

    let mut processed = 0;
    let mut failed = 0;

    for symbol in finnhub::TOP_STOCK_SYMBOLS {
        match stocks.fetch_quote(symbol).await {
            Ok(quote) => {
                ctx.price_book.insert(quote);
                processed += 1;
            }
            Err(e) => {
                warn!("failed to fetch stock quote for {}: {}", symbol, e);
                failed += 1;
            }
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(INTER_TICKER_DELAY_MS)).await;
    }

    info!("refreshed {} stock quotes, {} failed", processed, failed);

    Ok(JobResult {
        items_processed: processed,
        items_failed: failed,
    })
}
