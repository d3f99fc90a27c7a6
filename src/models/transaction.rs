use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

// Record of an executed buy or sell. Created once, never mutated; the
// account keeps these newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: uuid::Uuid,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
    pub total: f64,
    pub date: chrono::DateTime<chrono::Utc>,
}

impl Transaction {
    pub fn new(side: TradeSide, symbol: String, quantity: f64, price: f64, total: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            side,
            symbol,
            quantity,
            price,
            total,
            date: chrono::Utc::now(),
        }
    }
}
