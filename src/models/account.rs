use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Position, TradeSide, Transaction};

pub const DEFAULT_INITIAL_BALANCE: f64 = 100_000.0;

/// The aggregate for one user's simulator session: cash, open positions and
/// the transaction log. This is also the exact JSON shape the profile store
/// round-trips (camelCase keys, ISO-8601 dates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub portfolio: Vec<Position>,
    /// Newest first.
    pub transactions: Vec<Transaction>,
    pub current_balance: f64,
    pub initial_balance: f64,
    pub last_update: chrono::DateTime<chrono::Utc>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            portfolio: Vec::new(),
            transactions: Vec::new(),
            current_balance: DEFAULT_INITIAL_BALANCE,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            last_update: chrono::Utc::now(),
        }
    }
}

impl Account {
    /// Execute a buy of `usd_amount` worth of `symbol` at `price`.
    ///
    /// Returns the id of the opened position, or `None` when a precondition
    /// fails (non-positive amount, insufficient cash, unusable price). A
    /// rejected buy leaves the account untouched; this is form-validation
    /// territory, not an error.
    pub fn apply_buy(&mut self, symbol: &str, usd_amount: f64, price: f64) -> Option<Uuid> {
        if !(usd_amount > 0.0 && usd_amount <= self.current_balance && price > 0.0) {
            return None;
        }

        let quantity = usd_amount / price;
        let position = Position::open(symbol.to_string(), quantity, price);
        let position_id = position.id;

        self.current_balance -= usd_amount;
        self.portfolio.push(position);
        self.transactions.insert(
            0,
            Transaction::new(TradeSide::Buy, symbol.to_string(), quantity, price, usd_amount),
        );

        Some(position_id)
    }

    /// Close the position with the given id at its last refreshed price.
    ///
    /// Returns the sale proceeds, or `None` when no such position exists.
    pub fn apply_sell(&mut self, position_id: Uuid) -> Option<f64> {
        let index = self.portfolio.iter().position(|p| p.id == position_id)?;
        let position = self.portfolio.remove(index);

        let proceeds = position.quantity * position.current_price;
        self.current_balance += proceeds;
        self.transactions.insert(
            0,
            Transaction::new(
                TradeSide::Sell,
                position.symbol,
                position.quantity,
                position.current_price,
                proceeds,
            ),
        );

        Some(proceeds)
    }

    /// Revalue open positions against the latest feed snapshot.
    ///
    /// Symbols absent from the map are left as they were (stale, not zeroed,
    /// so a feed gap never shows up as a phantom loss). Returns how many
    /// positions were updated.
    pub fn refresh_valuations(&mut self, prices: &HashMap<String, f64>) -> usize {
        let mut updated = 0;
        for position in &mut self.portfolio {
            if let Some(&price) = prices.get(&position.symbol) {
                position.revalue(price);
                updated += 1;
            }
        }
        self.last_update = chrono::Utc::now();
        updated
    }

    /// Back to an empty account with the default starting balance.
    pub fn reset(&mut self) {
        *self = Account::default();
    }

    pub fn held_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for position in &self.portfolio {
            if !symbols.contains(&position.symbol) {
                symbols.push(position.symbol.clone());
            }
        }
        symbols
    }

    // ---- derived performance metrics ----

    pub fn portfolio_value(&self) -> f64 {
        self.portfolio.iter().map(|p| p.total_value).sum()
    }

    pub fn unrealized_profit_loss(&self) -> f64 {
        self.portfolio.iter().map(|p| p.profit_loss).sum()
    }

    pub fn unrealized_profit_loss_percent(&self) -> f64 {
        let invested: f64 = self.portfolio.iter().map(|p| p.cost_basis()).sum();
        if invested == 0.0 {
            return 0.0;
        }
        self.unrealized_profit_loss() / invested * 100.0
    }

    /// Cash plus the current value of every open position.
    pub fn total_value(&self) -> f64 {
        self.current_balance + self.portfolio_value()
    }

    pub fn total_return(&self) -> f64 {
        self.total_value() - self.initial_balance
    }

    pub fn total_return_percent(&self) -> f64 {
        self.total_return() / self.initial_balance * 100.0
    }

    pub fn best_performer(&self) -> Option<&Position> {
        self.portfolio.iter().max_by(|a, b| {
            a.profit_loss_percent
                .partial_cmp(&b.profit_loss_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: f64, expected: f64) {
        let tolerance = expected.abs().max(1.0) * 1e-6;
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    fn prices(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    #[test]
    fn buy_opens_position_and_records_transaction() {
        let mut account = Account::default();
        let id = account.apply_buy("BTCUSDT", 1_000.0, 45_000.0).unwrap();

        assert_eq!(account.portfolio.len(), 1);
        assert_eq!(account.transactions.len(), 1);
        approx(account.current_balance, 99_000.0);

        let position = &account.portfolio[0];
        assert_eq!(position.id, id);
        approx(position.quantity, 1_000.0 / 45_000.0);
        approx(position.buy_price, 45_000.0);
        approx(position.total_value, 1_000.0);

        let tx = &account.transactions[0];
        assert_eq!(tx.side, TradeSide::Buy);
        assert_eq!(tx.symbol, "BTCUSDT");
        approx(tx.total, 1_000.0);
    }

    #[test]
    fn buy_is_a_no_op_when_preconditions_fail() {
        let mut account = Account::default();
        let before = account.clone();

        assert!(account.apply_buy("BTCUSDT", 0.0, 45_000.0).is_none());
        assert!(account.apply_buy("BTCUSDT", -10.0, 45_000.0).is_none());
        assert!(account.apply_buy("BTCUSDT", 100_000.01, 45_000.0).is_none());
        assert!(account.apply_buy("BTCUSDT", f64::NAN, 45_000.0).is_none());
        assert!(account.apply_buy("BTCUSDT", 1_000.0, 0.0).is_none());

        assert_eq!(account, before);
    }

    #[test]
    fn sell_of_unknown_position_is_a_no_op() {
        let mut account = Account::default();
        account.apply_buy("ETHUSDT", 500.0, 3_000.0).unwrap();
        let before = account.clone();

        assert!(account.apply_sell(Uuid::new_v4()).is_none());
        assert_eq!(account, before);
    }

    #[test]
    fn sell_removes_exactly_one_position() {
        let mut account = Account::default();
        let first = account.apply_buy("BTCUSDT", 1_000.0, 45_000.0).unwrap();
        account.apply_buy("BTCUSDT", 2_000.0, 45_000.0).unwrap();

        let sold_quantity = account.portfolio[0].quantity;
        let proceeds = account.apply_sell(first).unwrap();

        approx(proceeds, 1_000.0);
        assert_eq!(account.portfolio.len(), 1);
        assert_eq!(account.transactions.len(), 3);

        let tx = &account.transactions[0];
        assert_eq!(tx.side, TradeSide::Sell);
        approx(tx.quantity, sold_quantity);
    }

    #[test]
    fn refresh_skips_symbols_absent_from_the_feed() {
        let mut account = Account::default();
        account.apply_buy("BTCUSDT", 1_000.0, 45_000.0).unwrap();
        account.apply_buy("ETHUSDT", 600.0, 3_000.0).unwrap();

        let updated = account.refresh_valuations(&prices(&[("ETHUSDT", 3_300.0)]));

        assert_eq!(updated, 1);
        let btc = &account.portfolio[0];
        approx(btc.current_price, 45_000.0);
        approx(btc.profit_loss, 0.0);

        let eth = &account.portfolio[1];
        approx(eth.current_price, 3_300.0);
        approx(eth.total_value, eth.quantity * 3_300.0);
        approx(eth.profit_loss, 60.0);
        approx(eth.profit_loss_percent, 10.0);
    }

    #[test]
    fn worked_example_matches_expected_numbers() {
        let mut account = Account::default();
        account.apply_buy("BTCUSDT", 1_000.0, 45_000.0).unwrap();
        approx(account.current_balance, 99_000.0);
        approx(account.portfolio[0].quantity, 0.022222222222222223);

        account.refresh_valuations(&prices(&[("BTCUSDT", 46_000.0)]));
        approx(account.portfolio[0].total_value, 1_022.2222222222222);
        approx(account.portfolio[0].profit_loss, 22.22222222222217);

        let id = account.portfolio[0].id;
        account.apply_sell(id).unwrap();
        approx(account.current_balance, 100_022.22222222222);
        assert!(account.portfolio.is_empty());
        assert_eq!(account.transactions.len(), 2);
        approx(account.transactions[0].total, 1_022.2222222222222);
    }

    #[test]
    fn value_is_conserved_across_buys_and_sells() {
        let mut account = Account::default();
        account.apply_buy("BTCUSDT", 1_000.0, 45_000.0).unwrap();
        account.apply_buy("ETHUSDT", 2_500.0, 3_000.0).unwrap();

        // No price movement: total value equals the starting balance.
        approx(account.total_value(), DEFAULT_INITIAL_BALANCE);
        approx(account.total_return(), 0.0);

        // Price drift moves total value by exactly the unrealized P&L.
        account.refresh_valuations(&prices(&[("BTCUSDT", 47_000.0), ("ETHUSDT", 2_800.0)]));
        approx(
            account.total_value(),
            DEFAULT_INITIAL_BALANCE + account.unrealized_profit_loss(),
        );

        // Selling converts unrealized into realized without creating value.
        let expected_total = account.total_value();
        let id = account.portfolio[0].id;
        account.apply_sell(id).unwrap();
        approx(account.total_value(), expected_total);
    }

    #[test]
    fn reset_restores_the_default_account() {
        let mut account = Account::default();
        account.apply_buy("BTCUSDT", 5_000.0, 45_000.0).unwrap();
        account.refresh_valuations(&prices(&[("BTCUSDT", 48_000.0)]));

        account.reset();

        assert!(account.portfolio.is_empty());
        assert!(account.transactions.is_empty());
        approx(account.current_balance, DEFAULT_INITIAL_BALANCE);
        approx(account.initial_balance, DEFAULT_INITIAL_BALANCE);
    }

    #[test]
    fn best_performer_picks_the_highest_percentage_gain() {
        let mut account = Account::default();
        account.apply_buy("BTCUSDT", 1_000.0, 45_000.0).unwrap();
        account.apply_buy("ETHUSDT", 1_000.0, 3_000.0).unwrap();
        account.refresh_valuations(&prices(&[("BTCUSDT", 46_000.0), ("ETHUSDT", 3_600.0)]));

        assert_eq!(account.best_performer().unwrap().symbol, "ETHUSDT");
    }

    #[test]
    fn serializes_with_the_stored_wire_shape() {
        let mut account = Account::default();
        account.apply_buy("BTCUSDT", 1_000.0, 45_000.0).unwrap();

        let value = serde_json::to_value(&account).unwrap();
        assert!(value.get("currentBalance").is_some());
        assert!(value.get("initialBalance").is_some());
        assert!(value.get("lastUpdate").is_some());

        let position = &value["portfolio"][0];
        assert!(position.get("buyPrice").is_some());
        assert!(position.get("profitLossPercent").is_some());
        assert!(position.get("buyDate").is_some());

        let tx = &value["transactions"][0];
        assert_eq!(tx["type"], "buy");

        let round_tripped: Account = serde_json::from_value(value).unwrap();
        assert_eq!(round_tripped, account);
    }
}
