//! Tidemark Core: Traits and types for the tidemark change-propagation subsystem
//!
//! This crate defines the core abstractions for a watermark-based
//! change-data-capture pipeline over an order store:
//! - Order store (SQLite): Orders plus an append-only priority-change log
//! - Watermark: Durable cursor marking the highest fully processed change
//! - Poller: Drains unprocessed changes exactly once, in id order
//!
//! Key properties:
//! - Single-transaction cycles: Marking changes processed and advancing the
//!   watermark commit together or not at all
//! - Single-writer discipline: Only the poller touches the watermark and the
//!   processed flags; only the ingress path touches order priority
//! - Crash safety: A cycle that fails mid-way leaves no visible state behind

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{PollerConfig, StoreConfig, SynchronousMode};
pub use error::{Result, TidemarkError};
pub use traits::{OrderStore, PollSource, PollTxn};
pub use types::{ChangeId, NewOrder, Order, OrderId, Priority, PriorityChange};
