use rusqlite::{params, Connection};
use std::sync::MutexGuard;
use tidemark_core::{
    error::{Result, TidemarkError},
    traits::PollTxn,
    types::{ChangeId, Order, PriorityChange},
};

use crate::store::priority_from_sql;

/// Poll-cycle transaction holding the connection for its full extent.
///
/// BEGIN IMMEDIATE takes the write lock up front, so concurrent ingress
/// writers queue behind the cycle rather than failing it mid-way.
pub struct SqlitePollTxn<'a> {
    conn: MutexGuard<'a, Connection>,
    in_txn: bool,
}

impl<'a> SqlitePollTxn<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Result<Self> {
        conn.execute("BEGIN IMMEDIATE TRANSACTION", [])
            .map_err(|e| TidemarkError::Transaction(e.to_string()))?;

        Ok(Self { conn, in_txn: true })
    }
}

impl<'a> PollTxn for SqlitePollTxn<'a> {
    fn watermark(&self) -> Result<ChangeId> {
        self.conn
            .query_row("SELECT watermark FROM poll_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .map_err(|e| TidemarkError::Storage(e.to_string()))
    }

    fn unprocessed_after(
        &self,
        watermark: ChangeId,
        limit: usize,
    ) -> Result<Vec<(PriorityChange, Order)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT pc.id, pc.order_id, pc.priority, pc.processed, pc.created_at,
                        o.id, o.customer_name, o.product_name, o.quantity,
                        o.shipping_address, o.priority, o.created_at
                 FROM priority_changes pc
                 JOIN orders o ON o.id = pc.order_id
                 WHERE pc.id > ?1 AND pc.processed = 0
                 ORDER BY pc.id ASC
                 LIMIT ?2",
            )
            .map_err(|e| TidemarkError::Storage(e.to_string()))?;

        // The watermark cutoff already excludes everything processed; the
        // explicit processed = 0 filter stays as a redundant safety net.
        let rows = stmt
            .query_map(params![watermark, limit as i64], |row| {
                let change = PriorityChange {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    priority: priority_from_sql(2, row.get(2)?)?,
                    processed: row.get(3)?,
                    created_at: row.get(4)?,
                };
                let order = Order {
                    id: row.get(5)?,
                    customer_name: row.get(6)?,
                    product_name: row.get(7)?,
                    quantity: row.get(8)?,
                    shipping_address: row.get(9)?,
                    priority: priority_from_sql(10, row.get(10)?)?,
                    created_at: row.get(11)?,
                };
                Ok((change, order))
            })
            .map_err(|e| TidemarkError::Storage(e.to_string()))?;

        // A decode failure on any row aborts the whole cycle; nothing has
        // committed, so every row is retried next cycle.
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TidemarkError::Decode(e.to_string()))
    }

    fn mark_processed(&mut self, id: ChangeId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE priority_changes SET processed = 1 WHERE id = ?1",
                [id],
            )
            .map_err(|e| TidemarkError::Storage(e.to_string()))?;
        Ok(())
    }

    fn set_watermark(&mut self, watermark: ChangeId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE poll_state SET watermark = ?1 WHERE id = 1",
                [watermark],
            )
            .map_err(|e| TidemarkError::Storage(e.to_string()))?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        if self.in_txn {
            self.conn
                .execute("COMMIT", [])
                .map_err(|e| TidemarkError::Transaction(e.to_string()))?;
            self.in_txn = false;
        }
        Ok(())
    }

    fn rollback(mut self: Box<Self>) {
        if self.in_txn {
            let _ = self.conn.execute("ROLLBACK", []);
            self.in_txn = false;
        }
    }
}

impl<'a> Drop for SqlitePollTxn<'a> {
    fn drop(&mut self) {
        if self.in_txn {
            let _ = self.conn.execute("ROLLBACK", []);
        }
    }
}
