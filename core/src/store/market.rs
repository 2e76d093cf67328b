use super::StatsStore;
use crate::{
    error::{StatsError, StatsResult},
    market::MarketQuote,
    types::{self, ItemName},
};
use chrono::{DateTime, Utc};
use rusqlite::params;
use std::collections::HashMap;

fn quote_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MarketQuote> {
    Ok(MarketQuote {
        id: row.get(0)?,
        timestamp: StatsStore::ts_column(row, 1)?,
        item_name: row.get(2)?,
        item_id: row.get(3)?,
        buy_price: row.get(4)?,
        sell_price: row.get(5)?,
    })
}

impl StatsStore {
    // ── Market quotes ──────────────────────────────────────────

    /// Persist one quote. A duplicate (timestamp, item_name) pair returns
    /// `DuplicateKey` and leaves the first writer's row in place.
    pub fn record_quote(&self, quote: &MarketQuote) -> StatsResult<MarketQuote> {
        let inserted = self.conn.execute(
            "INSERT INTO market_prices (timestamp, item_name, item_id, buy_price, sell_price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                types::fmt_ts(&quote.timestamp),
                &quote.item_name,
                quote.item_id,
                quote.buy_price,
                quote.sell_price
            ],
        );
        if let Err(e) = inserted {
            if Self::is_unique_violation(&e) {
                return Err(StatsError::DuplicateKey {
                    entity: "market_quote",
                    key: format!("{}, {}", types::fmt_ts(&quote.timestamp), quote.item_name),
                });
            }
            return Err(e.into());
        }
        let mut stored = quote.clone();
        stored.id = Some(self.conn.last_insert_rowid());
        Ok(stored)
    }

    /// The most recent quote per item, keyed by item name. Each item's
    /// latest is picked by timestamp independently of the others.
    pub fn latest_quotes(&self) -> StatsResult<HashMap<ItemName, MarketQuote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, item_name, item_id, buy_price, sell_price
             FROM market_prices mp
             WHERE timestamp = (SELECT MAX(timestamp) FROM market_prices mp2
                                WHERE mp2.item_name = mp.item_name)",
        )?;
        let rows = stmt.query_map([], quote_from_row)?;
        let mut latest = HashMap::new();
        for row in rows {
            let quote = row?;
            latest.insert(quote.item_name.clone(), quote);
        }
        Ok(latest)
    }

    /// Quotes for an item inside [from, to], both ends inclusive, ascending
    /// by timestamp.
    pub fn quote_history(
        &self,
        item: &str,
        from: &DateTime<Utc>,
        to: &DateTime<Utc>,
    ) -> StatsResult<Vec<MarketQuote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, item_name, item_id, buy_price, sell_price
             FROM market_prices
             WHERE item_name = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(
            params![item, types::fmt_ts(from), types::fmt_ts(to)],
            quote_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Mean of the stored average_price over quotes at or after `since`.
    /// None when the item has no quotes in the window; the caller decides
    /// what that means, there is no synthetic fallback price.
    pub fn average_price_since(
        &self,
        item: &str,
        since: &DateTime<Utc>,
    ) -> StatsResult<Option<f64>> {
        self.conn
            .query_row(
                "SELECT AVG(average_price) FROM market_prices
                 WHERE item_name = ?1 AND timestamp >= ?2",
                params![item, types::fmt_ts(since)],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn quote_count(&self, item: &str) -> StatsResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM market_prices WHERE item_name = ?1",
                params![item],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
