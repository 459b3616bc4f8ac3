//! Change poller: Watermark-driven event drain loop
//!
//! Consumes priority-change records from the order store and marks them
//! processed exactly once, in id order.
//!
//! Key features:
//! - One transaction per cycle: processed flags and watermark commit together
//! - Arbitrary filter predicate over the referenced order
//! - Graceful shutdown
//! - Deterministic single cycles (`run_once`) for tests

pub mod poller;

pub use poller::{product_filter, ChangePoller, FilterPredicate, PollStats};
