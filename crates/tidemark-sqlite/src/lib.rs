//! SQLite-backed order store implementation
//!
//! Durable home for orders, their priority-change log, and the poll
//! watermark.
//!
//! Key features:
//! - Atomic priority escalation (order update + change append in one txn)
//! - Watermark tracking in a singleton `poll_state` row
//! - WAL mode for better concurrency
//! - Poll-cycle transactions that hold the connection for their full extent

pub mod schema;
pub mod store;
pub mod txn;

pub use store::SqliteOrderStore;
pub use txn::SqlitePollTxn;
