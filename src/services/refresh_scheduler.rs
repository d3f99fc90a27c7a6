use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::AppError;
use crate::external::finnhub::FinnhubProvider;
use crate::external::market_provider::MarketDataProvider;
use crate::jobs::{stock_quote_refresh_job, valuation_refresh_job};
use crate::services::price_book::PriceBook;
use crate::services::simulator_service::SimulatorService;

// Format: sec min hour day month weekday. The stock board is staggered off
// the valuation tick so the two fetch bursts don't coincide.
const VALUATION_REFRESH_SCHEDULE: &str = "*/30 * * * * *";
const STOCK_REFRESH_SCHEDULE: &str = "15,45 * * * * *";

/// Context passed to job functions.
#[derive(Clone)]
pub struct JobContext {
    pub market: Arc<dyn MarketDataProvider>,
    pub stocks: Option<Arc<FinnhubProvider>>,
    pub price_book: Arc<PriceBook>,
    pub simulator: Arc<SimulatorService>,
}

/// Drives the periodic market polling for as long as the engine runs.
/// Overlapping runs are possible when a fetch outlasts the interval; the
/// price book resolves that as last-write-wins.
pub struct RefreshScheduler {
    scheduler: JobScheduler,
    context: JobContext,
}

impl RefreshScheduler {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting market refresh scheduler...");

        self.schedule_job(
            VALUATION_REFRESH_SCHEDULE,
            "valuation_refresh",
            "Every 30 seconds",
            valuation_refresh_job::run_valuation_refresh,
        )
        .await?;

        if self.context.stocks.is_some() {
            self.schedule_job(
                STOCK_REFRESH_SCHEDULE,
                "stock_quote_refresh",
                "Every 30 seconds, staggered",
                stock_quote_refresh_job::run_stock_quote_refresh,
            )
            .await?;
        }

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Refresh scheduler started");
        Ok(())
    }

    /// Stop polling. Called on engine teardown.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping refresh scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Refresh scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_logging(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

async fn execute_job_with_logging<F, Fut>(job_name: &str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    let started_at = Utc::now();
    let result = job_fn(context).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );
        }
        Err(e) => {
            // Feed and store outages are recoverable; the next tick retries.
            error!("❌ Job failed: {} - {}", job_name, e);
        }
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}
