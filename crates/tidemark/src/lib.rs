//! Tidemark: Order store with a watermark-based change-propagation poller
//!
//! A miniature change-data-capture pipeline: the ingress path creates
//! orders and escalates their priority, appending one durable change
//! record per escalation in the same transaction. The poller drains those
//! records in id order, exactly once, advancing a durable watermark in the
//! same transaction that marks them processed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tidemark::prelude::*;
//!
//! # fn main() -> tidemark::Result<()> {
//! let db = TidemarkDb::open(StoreConfig::new("orders.db".into()))?;
//!
//! let id = db.store().create_order(NewOrder {
//!     customer_name: "Ada".into(),
//!     product_name: "ninja".into(),
//!     quantity: 2,
//!     shipping_address: "1 Loop Rd".into(),
//!     priority: Priority::Normal,
//! })?;
//! db.store().escalate_priority(id, Priority::High)?;
//!
//! let poller = Arc::new(db.poller(PollerConfig::default(), product_filter("ninja")));
//! # let _ = poller;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub use tidemark_core::{
    ChangeId, NewOrder, Order, OrderId, OrderStore, PollSource, PollTxn, PollerConfig, Priority,
    PriorityChange, Result, StoreConfig, SynchronousMode, TidemarkError,
};
pub use tidemark_poller::{product_filter, ChangePoller, FilterPredicate, PollStats};
pub use tidemark_sqlite::{SqliteOrderStore, SqlitePollTxn};

/// The wired-up store plus poller factory
pub struct TidemarkDb {
    store: Arc<SqliteOrderStore>,
}

impl TidemarkDb {
    /// Open the store; the only place a fatal error can come from
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        let store = Arc::new(SqliteOrderStore::open(cfg)?);
        tracing::info!("tidemark store open");
        Ok(Self { store })
    }

    pub fn store(&self) -> &Arc<SqliteOrderStore> {
        &self.store
    }

    /// Build a poller over this store with the given filter predicate
    pub fn poller(
        &self,
        cfg: PollerConfig,
        filter: FilterPredicate,
    ) -> ChangePoller<SqliteOrderStore> {
        ChangePoller::new(Arc::clone(&self.store), cfg, filter)
    }
}

pub mod prelude {
    pub use crate::TidemarkDb;
    pub use tidemark_core::{
        NewOrder, Order, OrderStore, PollerConfig, Priority, PriorityChange, StoreConfig,
    };
    pub use tidemark_poller::{product_filter, ChangePoller, FilterPredicate, PollStats};
    pub use tidemark_sqlite::SqliteOrderStore;
}
