//! Poller behavior against a real SQLite store: failure injection, batching,
//! predicate generality, shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tidemark_core::{
    error::{Result, TidemarkError},
    traits::{OrderStore, PollSource, PollTxn},
    types::{ChangeId, Order, PriorityChange},
    NewOrder, PollerConfig, Priority, StoreConfig,
};
use tidemark_poller::{product_filter, ChangePoller};
use tidemark_sqlite::{SqliteOrderStore, SqlitePollTxn};

fn open_store() -> (Arc<SqliteOrderStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StoreConfig::new(dir.path().join("orders.db"));
    (Arc::new(SqliteOrderStore::open(cfg).unwrap()), dir)
}

fn order(product: &str, quantity: u32) -> NewOrder {
    NewOrder {
        customer_name: "Ada".into(),
        product_name: product.into(),
        quantity,
        shipping_address: "1 Loop Rd".into(),
        priority: Priority::Normal,
    }
}

/// Wraps the real store but fails every commit while `armed` is set,
/// rolling the cycle back instead.
struct FailingCommitSource {
    inner: Arc<SqliteOrderStore>,
    armed: Arc<AtomicBool>,
}

struct FailingCommitTxn<'a> {
    inner: SqlitePollTxn<'a>,
    armed: Arc<AtomicBool>,
}

impl PollSource for FailingCommitSource {
    type Txn<'a> = FailingCommitTxn<'a>;

    fn begin_poll(&self) -> Result<Self::Txn<'_>> {
        Ok(FailingCommitTxn {
            inner: self.inner.begin_poll()?,
            armed: Arc::clone(&self.armed),
        })
    }
}

impl<'a> PollTxn for FailingCommitTxn<'a> {
    fn watermark(&self) -> Result<ChangeId> {
        self.inner.watermark()
    }

    fn unprocessed_after(
        &self,
        watermark: ChangeId,
        limit: usize,
    ) -> Result<Vec<(PriorityChange, Order)>> {
        self.inner.unprocessed_after(watermark, limit)
    }

    fn mark_processed(&mut self, id: ChangeId) -> Result<()> {
        self.inner.mark_processed(id)
    }

    fn set_watermark(&mut self, watermark: ChangeId) -> Result<()> {
        self.inner.set_watermark(watermark)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        if self.armed.load(Ordering::SeqCst) {
            Box::new(self.inner).rollback();
            return Err(TidemarkError::Transaction("injected commit failure".into()));
        }
        Box::new(self.inner).commit()
    }

    fn rollback(self: Box<Self>) {
        Box::new(self.inner).rollback();
    }
}

#[test]
fn commit_failure_leaves_no_trace_and_retry_succeeds() {
    let (store, _dir) = open_store();
    let id = store.create_order(order("ninja", 1)).unwrap();
    let change_id = store.escalate_priority(id, Priority::High).unwrap();

    let armed = Arc::new(AtomicBool::new(true));
    let source = Arc::new(FailingCommitSource {
        inner: Arc::clone(&store),
        armed: Arc::clone(&armed),
    });
    let poller = ChangePoller::new(source, PollerConfig::default(), product_filter("ninja"));

    // Failed cycle: the change would have been processed, nothing survives
    poller.run_once().unwrap_err();
    assert_eq!(store.watermark().unwrap(), 0);
    assert!(!store.get_change(change_id).unwrap().unwrap().processed);

    // Disarm and retry: the same change goes through normally
    armed.store(false, Ordering::SeqCst);
    let stats = poller.run_once().unwrap();
    assert_eq!(stats.changes_processed, 1);
    assert_eq!(store.watermark().unwrap(), change_id);
    assert!(store.get_change(change_id).unwrap().unwrap().processed);
}

#[test]
fn batch_limit_defers_the_tail_to_later_cycles() {
    let (store, _dir) = open_store();
    let mut change_ids = Vec::new();
    for _ in 0..5 {
        let id = store.create_order(order("ninja", 1)).unwrap();
        change_ids.push(store.escalate_priority(id, Priority::High).unwrap());
    }

    let config = PollerConfig::default().with_batch_max(2);
    let poller = ChangePoller::new(Arc::clone(&store), config, product_filter("ninja"));

    let stats = poller.run_once().unwrap();
    assert_eq!(stats.changes_processed, 2);
    assert_eq!(store.watermark().unwrap(), change_ids[1]);

    // Two more cycles drain the rest; nothing is skipped
    poller.run_once().unwrap();
    let stats = poller.run_once().unwrap();
    assert_eq!(stats.changes_processed, 1);
    assert_eq!(store.watermark().unwrap(), *change_ids.last().unwrap());
    for change_id in change_ids {
        assert!(store.get_change(change_id).unwrap().unwrap().processed);
    }
}

#[test]
fn matching_change_behind_a_long_non_matching_run_is_reached() {
    let (store, _dir) = open_store();

    // A run of non-matching changes longer than the batch, then one match
    let mut widget_changes = Vec::new();
    for _ in 0..3 {
        let id = store.create_order(order("widget", 1)).unwrap();
        widget_changes.push(store.escalate_priority(id, Priority::High).unwrap());
    }
    let ninja = store.create_order(order("ninja", 1)).unwrap();
    let e_ninja = store.escalate_priority(ninja, Priority::High).unwrap();

    let config = PollerConfig::default().with_batch_max(2);
    let poller = ChangePoller::new(Arc::clone(&store), config, product_filter("ninja"));

    // One cycle scans past the widget run and drains the ninja change
    let stats = poller.run_once().unwrap();
    assert_eq!(stats.changes_processed, 1);
    assert!(store.get_change(e_ninja).unwrap().unwrap().processed);
    assert_eq!(store.watermark().unwrap(), e_ninja);
    for change_id in widget_changes {
        assert!(!store.get_change(change_id).unwrap().unwrap().processed);
    }

    // And the next cycle finds nothing left to do
    let stats = poller.run_once().unwrap();
    assert_eq!(stats.changes_processed, 0);
}

#[test]
fn predicate_can_use_any_order_attribute() {
    let (store, _dir) = open_store();
    let small = store.create_order(order("ninja", 1)).unwrap();
    let bulk = store.create_order(order("ninja", 500)).unwrap();
    let c_small = store.escalate_priority(small, Priority::High).unwrap();
    let c_bulk = store.escalate_priority(bulk, Priority::High).unwrap();

    let poller = ChangePoller::new(
        Arc::clone(&store),
        PollerConfig::default(),
        Box::new(|o: &Order| o.quantity >= 100),
    );
    let stats = poller.run_once().unwrap();

    assert_eq!(stats.changes_processed, 1);
    assert!(!store.get_change(c_small).unwrap().unwrap().processed);
    assert!(store.get_change(c_bulk).unwrap().unwrap().processed);
}

#[test]
fn empty_cycle_reports_zero_and_keeps_the_watermark() {
    let (store, _dir) = open_store();
    let poller = ChangePoller::new(
        Arc::clone(&store),
        PollerConfig::default(),
        product_filter("ninja"),
    );

    let stats = poller.run_once().unwrap();
    assert_eq!(stats.changes_processed, 0);
    assert_eq!(stats.new_watermark, 0);
    assert_eq!(store.watermark().unwrap(), 0);
}

#[tokio::test]
async fn run_continuous_stops_on_shutdown() {
    let (store, _dir) = open_store();
    let config = PollerConfig::default()
        .with_poll_interval_ms(10)
        .with_error_backoff_ms(10);
    let poller = Arc::new(ChangePoller::new(
        Arc::clone(&store),
        config,
        product_filter("ninja"),
    ));

    let handle = {
        let poller = Arc::clone(&poller);
        tokio::spawn(async move { poller.run_continuous().await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    poller.shutdown();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("poller did not stop after shutdown")
        .unwrap()
        .unwrap();
}
