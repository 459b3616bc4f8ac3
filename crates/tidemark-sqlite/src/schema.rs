use rusqlite::Connection;
use tidemark_core::error::{Result, TidemarkError};

/// Create the tables if needed and seed the watermark row.
///
/// Safe to call on every open; all statements are idempotent.
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_name TEXT NOT NULL,
            product_name TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            shipping_address TEXT NOT NULL,
            priority TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| TidemarkError::Storage(e.to_string()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS priority_changes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL REFERENCES orders(id),
            priority TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| TidemarkError::Storage(e.to_string()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS poll_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            watermark INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .map_err(|e| TidemarkError::Storage(e.to_string()))?;

    // Seed the singleton row; 0 means no changes processed yet
    conn.execute(
        "INSERT OR IGNORE INTO poll_state (id, watermark) VALUES (1, 0)",
        [],
    )
    .map_err(|e| TidemarkError::Storage(e.to_string()))?;

    Ok(())
}
