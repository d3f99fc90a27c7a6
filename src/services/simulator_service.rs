use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::profile_store::{StateStore, StoreError};
use crate::models::Account;
use crate::services::price_book::PriceBook;
use crate::session::Session;

/// Persistence gate. Saves are refused until the initial load has resolved,
/// so an early save can never clobber valid remote state with defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Uninitialized,
    Loaded,
}

/// How `load` resolved. Every variant leaves the simulator usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Saved state existed and was restored.
    Restored,
    /// Nothing saved yet; starting from defaults.
    Fresh,
    /// Saved state exists but could not be parsed; starting from defaults.
    Corrupt(String),
    /// The store could not be reached; starting from defaults.
    Unavailable(String),
}

/// Owns the in-memory Account, keeps valuations fresh against the price
/// feed, and keeps the remote copy eventually consistent with local state.
///
/// Local state is the source of truth for the session: store failures are
/// surfaced as a retained soft error and never roll anything back.
pub struct SimulatorService {
    store: Arc<dyn StateStore>,
    session: Session,
    account: RwLock<Account>,
    phase: RwLock<LoadPhase>,
    sync_error: RwLock<Option<String>>,
}

impl SimulatorService {
    pub fn new(store: Arc<dyn StateStore>, session: Session) -> Self {
        Self {
            store,
            session,
            account: RwLock::new(Account::default()),
            phase: RwLock::new(LoadPhase::Uninitialized),
            sync_error: RwLock::new(None),
        }
    }

    /// Fetch previously persisted state, falling back to a default account
    /// on any failure. Opens the persistence gate in every outcome.
    pub async fn load(&self) -> LoadOutcome {
        let outcome = match self.store.fetch(&self.session).await {
            Ok(Some(account)) => {
                *self.account.write() = account;
                LoadOutcome::Restored
            }
            Ok(None) => {
                *self.account.write() = Account::default();
                LoadOutcome::Fresh
            }
            Err(StoreError::Parse(msg)) => {
                *self.account.write() = Account::default();
                LoadOutcome::Corrupt(msg)
            }
            Err(e) => {
                *self.account.write() = Account::default();
                LoadOutcome::Unavailable(e.to_string())
            }
        };

        match &outcome {
            LoadOutcome::Restored => {
                info!("restored saved simulator state");
                self.set_sync_error(None);
            }
            LoadOutcome::Fresh => {
                info!("no saved simulator state, starting fresh");
                self.set_sync_error(Some("No saved simulator data found, starting fresh."));
            }
            LoadOutcome::Corrupt(msg) => {
                warn!("saved simulator state is unreadable: {}", msg);
                self.set_sync_error(Some("Error parsing saved simulator data."));
            }
            LoadOutcome::Unavailable(msg) => {
                warn!("could not load simulator state: {}", msg);
                self.set_sync_error(Some("Unable to load simulator data. Please try again."));
            }
        }

        *self.phase.write() = LoadPhase::Loaded;
        outcome
    }

    /// Buy `usd_amount` worth of `symbol` at the book's latest price.
    ///
    /// Silent no-op (`None`) when no price is available or the account
    /// rejects the order; these are form-validation conditions, not errors.
    pub async fn buy(&self, symbol: &str, usd_amount: f64, prices: &PriceBook) -> Option<Uuid> {
        let price = prices.price(symbol)?;
        let position_id = self.account.write().apply_buy(symbol, usd_amount, price)?;

        info!("bought ${:.2} of {} at {:.2}", usd_amount, symbol, price);
        self.persist().await;
        Some(position_id)
    }

    /// Close a position at its last refreshed price. Returns the proceeds,
    /// or `None` when no such position exists.
    pub async fn sell(&self, position_id: Uuid) -> Option<f64> {
        let proceeds = self.account.write().apply_sell(position_id)?;

        info!("sold position {} for ${:.2}", position_id, proceeds);
        self.persist().await;
        Some(proceeds)
    }

    /// Revalue open positions against the latest feed snapshot. Returns how
    /// many positions were updated.
    pub async fn refresh_valuations(&self, latest_prices: &HashMap<String, f64>) -> usize {
        let updated = self.account.write().refresh_valuations(latest_prices);
        self.persist().await;
        updated
    }

    /// Push the current state to the profile store. No-op until `load` has
    /// completed; failures are retained as a soft error for the UI.
    pub async fn persist(&self) {
        if *self.phase.read() != LoadPhase::Loaded {
            return;
        }

        let snapshot = self.account.read().clone();
        match self.store.save(&self.session, &snapshot).await {
            Ok(()) => self.set_sync_error(None),
            Err(e) => {
                warn!("failed to save simulator state: {}", e);
                self.set_sync_error(Some("Failed to save simulator data."));
            }
        }
    }

    /// Delete the remote copy and reinitialize local state to defaults.
    /// Local state is reset even when the remote delete fails.
    pub async fn reset(&self) -> Result<(), AppError> {
        let remote = self.store.delete(&self.session).await;
        self.account.write().reset();

        match remote {
            Ok(()) => {
                info!("simulator account reset");
                self.set_sync_error(None);
                Ok(())
            }
            Err(e) => {
                warn!("failed to delete remote simulator state: {}", e);
                self.set_sync_error(Some("Failed to reset account. Please try again."));
                Err(e.into())
            }
        }
    }

    /// A copy of the current account, for display or persistence.
    pub fn snapshot(&self) -> Account {
        self.account.read().clone()
    }

    pub fn phase(&self) -> LoadPhase {
        *self.phase.read()
    }

    /// The current soft error, if any: the banner the UI would show.
    pub fn sync_error(&self) -> Option<String> {
        self.sync_error.read().clone()
    }

    fn set_sync_error(&self, message: Option<&str>) {
        *self.sync_error.write() = message.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::TickerQuote;

    /// Store double that can be primed with state or forced to fail.
    #[derive(Default)]
    struct StubStore {
        state: parking_lot::Mutex<Option<Account>>,
        fail_fetch: bool,
        corrupt: bool,
        fail_save: bool,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl StateStore for StubStore {
        async fn fetch(&self, _session: &Session) -> Result<Option<Account>, StoreError> {
            if self.fail_fetch {
                return Err(StoreError::Network("connection refused".into()));
            }
            if self.corrupt {
                return Err(StoreError::Parse("invalid type: string".into()));
            }
            Ok(self.state.lock().clone())
        }

        async fn save(&self, _session: &Session, account: &Account) -> Result<(), StoreError> {
            if self.fail_save {
                return Err(StoreError::Network("connection refused".into()));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.state.lock() = Some(account.clone());
            Ok(())
        }

        async fn delete(&self, _session: &Session) -> Result<(), StoreError> {
            *self.state.lock() = None;
            Ok(())
        }
    }

    fn service(store: Arc<StubStore>) -> SimulatorService {
        SimulatorService::new(store, Session::new("test-token"))
    }

    fn btc_book() -> PriceBook {
        let book = PriceBook::new();
        book.insert(TickerQuote {
            symbol: "BTCUSDT".to_string(),
            price: 45_000.0,
            price_change_percent: 2.5,
            market_cap: 0.0,
            volume: 0.0,
        });
        book
    }

    #[tokio::test]
    async fn persist_is_gated_until_load_completes() {
        let store = Arc::new(StubStore::default());
        let simulator = service(store.clone());

        simulator.persist().await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);

        simulator.load().await;
        simulator.persist().await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn buy_without_a_price_is_a_no_op() {
        let store = Arc::new(StubStore::default());
        let simulator = service(store.clone());
        simulator.load().await;

        let result = simulator.buy("DOGEUSDT", 1_000.0, &btc_book()).await;

        assert!(result.is_none());
        assert!(simulator.snapshot().portfolio.is_empty());
        // A rejected buy must not trigger a save.
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_buy_persists_the_new_state() {
        let store = Arc::new(StubStore::default());
        let simulator = service(store.clone());
        simulator.load().await;

        simulator.buy("BTCUSDT", 1_000.0, &btc_book()).await.unwrap();

        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        let saved = store.state.lock().clone().unwrap();
        assert_eq!(saved.portfolio.len(), 1);
        assert_eq!(saved.current_balance, 99_000.0);
    }

    #[tokio::test]
    async fn unreachable_store_falls_back_to_defaults_with_a_warning() {
        let store = Arc::new(StubStore {
            fail_fetch: true,
            ..Default::default()
        });
        let simulator = service(store);

        let outcome = simulator.load().await;

        assert!(matches!(outcome, LoadOutcome::Unavailable(_)));
        assert_eq!(simulator.phase(), LoadPhase::Loaded);
        assert_eq!(simulator.snapshot().current_balance, 100_000.0);
        assert!(simulator.sync_error().unwrap().contains("Unable to load"));
    }

    #[tokio::test]
    async fn corrupt_state_gets_a_distinct_warning() {
        let store = Arc::new(StubStore {
            corrupt: true,
            ..Default::default()
        });
        let simulator = service(store);

        let outcome = simulator.load().await;

        assert!(matches!(outcome, LoadOutcome::Corrupt(_)));
        assert!(simulator.sync_error().unwrap().contains("parsing"));
    }

    #[tokio::test]
    async fn failed_save_is_a_soft_error_and_keeps_local_state() {
        let store = Arc::new(StubStore {
            fail_save: true,
            ..Default::default()
        });
        let simulator = service(store);
        simulator.load().await;

        simulator.buy("BTCUSDT", 1_000.0, &btc_book()).await.unwrap();

        // Local state kept despite the failed save.
        assert_eq!(simulator.snapshot().portfolio.len(), 1);
        assert!(simulator.sync_error().unwrap().contains("Failed to save"));
    }

    #[tokio::test]
    async fn refresh_updates_positions_and_persists() {
        let store = Arc::new(StubStore::default());
        let simulator = service(store.clone());
        simulator.load().await;
        simulator.buy("BTCUSDT", 1_000.0, &btc_book()).await.unwrap();

        let latest: HashMap<String, f64> = [("BTCUSDT".to_string(), 46_000.0)].into();
        let updated = simulator.refresh_valuations(&latest).await;

        assert_eq!(updated, 1);
        assert_eq!(simulator.snapshot().portfolio[0].current_price, 46_000.0);
        assert_eq!(store.saves.load(Ordering::SeqCst), 2);
    }
}
