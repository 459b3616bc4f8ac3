use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tidemark_core::{
    error::{Result, TidemarkError},
    traits::{OrderStore, PollSource},
    types::{ChangeId, NewOrder, Order, OrderId, Priority, PriorityChange},
    StoreConfig,
};

use crate::schema;
use crate::txn::SqlitePollTxn;

/// SQLite-backed order store
pub struct SqliteOrderStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl SqliteOrderStore {
    /// Open (creating if needed) the store at the configured path.
    ///
    /// Failures here are startup failures; everything past open recovers
    /// locally.
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = cfg.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            &cfg.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| TidemarkError::Storage(e.to_string()))?;

        Self::configure_connection(&conn, &cfg)?;
        schema::init(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config: cfg,
        })
    }

    /// Get the underlying connection (for custom queries)
    ///
    /// Returns an Arc to the Mutex-protected SQLite connection.
    /// Users should lock the mutex to access the connection.
    pub fn conn(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Configure SQLite connection
    fn configure_connection(conn: &Connection, cfg: &StoreConfig) -> Result<()> {
        // Enable WAL mode
        if cfg.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(|e| TidemarkError::Config(e.to_string()))?;
        }

        // Set synchronous mode
        let sync_mode = match cfg.synchronous {
            tidemark_core::SynchronousMode::Full => "FULL",
            tidemark_core::SynchronousMode::Normal => "NORMAL",
            tidemark_core::SynchronousMode::Off => "OFF",
        };
        conn.pragma_update(None, "synchronous", sync_mode)
            .map_err(|e| TidemarkError::Config(e.to_string()))?;

        // Referential integrity for priority_changes.order_id
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| TidemarkError::Config(e.to_string()))?;

        // Set cache size
        conn.pragma_update(None, "cache_size", cfg.cache_size)
            .map_err(|e| TidemarkError::Config(e.to_string()))?;

        Ok(())
    }
}

impl OrderStore for SqliteOrderStore {
    fn create_order(&self, order: NewOrder) -> Result<OrderId> {
        if order.quantity == 0 {
            return Err(TidemarkError::InvalidOrder(
                "quantity must be a positive integer".into(),
            ));
        }

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO orders (
                customer_name,
                product_name,
                quantity,
                shipping_address,
                priority,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                order.customer_name,
                order.product_name,
                order.quantity,
                order.shipping_address,
                order.priority.to_string(),
                Utc::now(),
            ],
        )
        .map_err(|e| TidemarkError::Storage(e.to_string()))?;

        let id = conn.last_insert_rowid();
        tracing::info!(
            "inserted order #{}: {} x{} for {}, priority {}",
            id,
            order.product_name,
            order.quantity,
            order.customer_name,
            order.priority
        );
        Ok(id)
    }

    fn escalate_priority(&self, order_id: OrderId, priority: Priority) -> Result<ChangeId> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| TidemarkError::Transaction(e.to_string()))?;

        let updated = tx
            .execute(
                "UPDATE orders SET priority = ?1 WHERE id = ?2",
                params![priority.to_string(), order_id],
            )
            .map_err(|e| TidemarkError::Storage(e.to_string()))?;
        if updated == 0 {
            // Drop of `tx` rolls back; nothing was visible anyway
            return Err(TidemarkError::OrderNotFound(order_id));
        }

        tx.execute(
            "INSERT INTO priority_changes (order_id, priority, processed, created_at)
             VALUES (?1, ?2, 0, ?3)",
            params![order_id, priority.to_string(), Utc::now()],
        )
        .map_err(|e| TidemarkError::Storage(e.to_string()))?;
        let change_id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| TidemarkError::Transaction(e.to_string()))?;

        tracing::info!(
            "updated order #{} priority to {} and logged change #{}",
            order_id,
            priority,
            change_id
        );
        Ok(change_id)
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, customer_name, product_name, quantity, shipping_address,
                    priority, created_at
             FROM orders WHERE id = ?1",
            [id],
            order_from_row,
        )
        .optional()
        .map_err(|e| TidemarkError::Storage(e.to_string()))
    }

    fn get_change(&self, id: ChangeId) -> Result<Option<PriorityChange>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, order_id, priority, processed, created_at
             FROM priority_changes WHERE id = ?1",
            [id],
            change_from_row,
        )
        .optional()
        .map_err(|e| TidemarkError::Storage(e.to_string()))
    }

    fn watermark(&self) -> Result<ChangeId> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT watermark FROM poll_state WHERE id = 1", [], |row| {
            row.get(0)
        })
        .map_err(|e| TidemarkError::Storage(e.to_string()))
    }
}

impl PollSource for SqliteOrderStore {
    type Txn<'a> = SqlitePollTxn<'a>;

    fn begin_poll(&self) -> Result<Self::Txn<'_>> {
        let guard = self.conn.lock().unwrap();
        SqlitePollTxn::new(guard)
    }
}

pub(crate) fn priority_from_sql(idx: usize, s: String) -> rusqlite::Result<Priority> {
    s.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown priority level: {}", s).into(),
        )
    })
}

pub(crate) fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        product_name: row.get(2)?,
        quantity: row.get(3)?,
        shipping_address: row.get(4)?,
        priority: priority_from_sql(5, row.get(5)?)?,
        created_at: row.get(6)?,
    })
}

pub(crate) fn change_from_row(row: &Row<'_>) -> rusqlite::Result<PriorityChange> {
    Ok(PriorityChange {
        id: row.get(0)?,
        order_id: row.get(1)?,
        priority: priority_from_sql(2, row.get(2)?)?,
        processed: row.get(3)?,
        created_at: row.get(4)?,
    })
}
