use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tidemark_core::{
    error::Result,
    traits::{PollSource, PollTxn},
    types::{ChangeId, Order},
    PollerConfig,
};
use tokio::sync::Notify;

/// Predicate over the order a change refers to; only matching changes are
/// processed
pub type FilterPredicate = Box<dyn Fn(&Order) -> bool + Send + Sync>;

/// Matches orders for a single product, the shape the poller was built for
pub fn product_filter(product: impl Into<String>) -> FilterPredicate {
    let product = product.into();
    Box::new(move |order: &Order| order.product_name == product)
}

/// Poller: drains unprocessed priority changes and advances the watermark
pub struct ChangePoller<S>
where
    S: PollSource,
{
    source: Arc<S>,
    config: PollerConfig,
    filter: FilterPredicate,
    shutdown: Arc<AtomicBool>,
    /// Fired by `shutdown()` so `run_continuous` wakes out of its sleep
    /// instead of waiting out the poll interval.
    shutdown_notify: Arc<Notify>,
}

impl<S> ChangePoller<S>
where
    S: PollSource,
{
    pub fn new(source: Arc<S>, config: PollerConfig, filter: FilterPredicate) -> Self {
        Self {
            source,
            config,
            filter,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
        }
    }

    /// Run one poll cycle.
    ///
    /// Reads the watermark, marks every matching unprocessed change past it,
    /// advances the watermark to the highest id it marked, and commits all
    /// of that in one transaction. Any failure aborts the transaction and
    /// leaves every row for the next cycle.
    ///
    /// `batch_max` caps the changes processed per cycle, not the rows
    /// scanned: fetching continues past non-matching runs so a matching
    /// change behind them is reached in the same cycle.
    pub fn run_once(&self) -> Result<PollStats> {
        let start = Instant::now();

        let mut txn = self.source.begin_poll()?;
        let watermark = txn.watermark()?;

        let mut scan_from = watermark;
        let mut max_processed = watermark;
        let mut changes_processed = 0;
        'scan: loop {
            let candidates = txn.unprocessed_after(scan_from, self.config.batch_max)?;
            let exhausted = candidates.is_empty() || candidates.len() < self.config.batch_max;

            for (change, order) in &candidates {
                scan_from = change.id;
                if !(self.filter)(order) {
                    // Not ours; the watermark may pass it and it stays pending
                    continue;
                }

                txn.mark_processed(change.id)?;
                max_processed = change.id;
                changes_processed += 1;
                tracing::info!(
                    "processed priority change #{} for order #{}",
                    change.id,
                    change.order_id
                );
                if changes_processed >= self.config.batch_max {
                    break 'scan;
                }
            }

            if exhausted {
                break;
            }
        }

        if max_processed > watermark {
            txn.set_watermark(max_processed)?;
        }
        Box::new(txn).commit()?;

        Ok(PollStats {
            changes_processed,
            new_watermark: max_processed,
            duration: start.elapsed(),
        })
    }

    /// Run the poller continuously until shutdown.
    ///
    /// Sleeps `poll_interval_ms` between cycles, or `error_backoff_ms` after
    /// a failed one. Cycle failures are logged and retried forever; they
    /// never terminate the loop.
    pub async fn run_continuous(&self) -> Result<()> {
        while !self.shutdown.load(Ordering::SeqCst) {
            let wait = match self.run_once() {
                Ok(stats) => {
                    if stats.changes_processed > 0 {
                        tracing::debug!(
                            "cycle processed {} changes, watermark now {} ({:?})",
                            stats.changes_processed,
                            stats.new_watermark,
                            stats.duration
                        );
                    }
                    Duration::from_millis(self.config.poll_interval_ms)
                }
                Err(e) => {
                    tracing::warn!("poll cycle failed: {}", e);
                    Duration::from_millis(self.config.error_backoff_ms)
                }
            };

            tokio::select! {
                _ = self.shutdown_notify.notified() => {}
                _ = tokio::time::sleep(wait) => {}
            }
        }

        Ok(())
    }

    /// Signal graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_waiters();
    }
}

#[derive(Debug, Clone)]
pub struct PollStats {
    pub changes_processed: usize,
    /// Highest change id covered by the watermark after this cycle
    pub new_watermark: ChangeId,
    pub duration: Duration,
}
