//! Market quote records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One buy/sell quote for one item at one instant. The stored table derives
/// the integer midpoint in the schema; this method is the same computation
/// for rows that have not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub item_name: String,
    #[serde(default)]
    pub item_id: Option<i64>,
    pub buy_price: i64,
    pub sell_price: i64,
}

impl MarketQuote {
    /// Integer midpoint of buy and sell, truncated like the schema's
    /// generated column.
    pub fn average_price(&self) -> i64 {
        (self.buy_price + self.sell_price) / 2
    }
}
