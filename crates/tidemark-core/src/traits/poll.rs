use crate::error::Result;
use crate::types::{ChangeId, Order, PriorityChange};

/// Transaction for one poll cycle
///
/// All operations run on the same ambient transaction; `commit` makes the
/// processed flags and the watermark durable together, `rollback` (or drop)
/// discards everything.
///
/// Note: Not required to be Send, as some backends have thread-affine
/// transactions
pub trait PollTxn {
    /// Read the current watermark inside this transaction
    fn watermark(&self) -> Result<ChangeId>;

    /// Fetch unprocessed changes with id > `watermark`, joined to their
    /// order, ascending by id, at most `limit` rows
    fn unprocessed_after(
        &self,
        watermark: ChangeId,
        limit: usize,
    ) -> Result<Vec<(PriorityChange, Order)>>;

    /// Mark a single change as processed
    fn mark_processed(&mut self, id: ChangeId) -> Result<()>;

    /// Advance the watermark
    fn set_watermark(&mut self, watermark: ChangeId) -> Result<()>;

    /// Commit the cycle
    fn commit(self: Box<Self>) -> Result<()>;

    /// Roll back the cycle
    fn rollback(self: Box<Self>);
}

/// Source of poll transactions, implemented by the backing store
pub trait PollSource: Send + Sync {
    type Txn<'a>: PollTxn
    where
        Self: 'a;

    /// Begin a poll-cycle transaction
    fn begin_poll(&self) -> Result<Self::Txn<'_>>;
}
