use serde::{Deserialize, Serialize};

// One open simulated holding. Each buy opens its own position; there is no
// lot-merging, and a fully sold position is removed rather than zeroed.
//
// The derived fields (current price, value, P&L) are recomputed on every
// valuation refresh but persisted with the rest of the state so a reload can
// render the last known numbers before the next feed tick arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: uuid::Uuid,
    pub symbol: String,
    pub name: String,
    pub quantity: f64,
    pub buy_price: f64,
    pub current_price: f64,
    pub total_value: f64,
    pub profit_loss: f64,
    pub profit_loss_percent: f64,
    pub buy_date: chrono::DateTime<chrono::Utc>,
}

impl Position {
    pub fn open(symbol: String, quantity: f64, buy_price: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: symbol.clone(),
            symbol,
            quantity,
            buy_price,
            current_price: buy_price,
            total_value: quantity * buy_price,
            profit_loss: 0.0,
            profit_loss_percent: 0.0,
            buy_date: chrono::Utc::now(),
        }
    }

    /// Recompute the derived fields against a fresh price.
    pub fn revalue(&mut self, price: f64) {
        self.current_price = price;
        self.total_value = self.quantity * price;
        self.profit_loss = self.total_value - self.quantity * self.buy_price;
        self.profit_loss_percent = (price - self.buy_price) / self.buy_price * 100.0;
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.buy_price
    }
}
