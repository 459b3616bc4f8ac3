use crate::error::Result;
use crate::types::{ChangeId, NewOrder, Order, OrderId, Priority, PriorityChange};

/// Order store: durable orders plus their priority-change log
///
/// Provides:
/// - Order creation (single insert, no cross-table transaction)
/// - Atomic priority escalation (order update + change-log append commit
///   together or not at all)
/// - Read accessors for orders, changes, and the poll watermark
pub trait OrderStore: Send + Sync {
    /// Insert a new order and return its assigned id
    fn create_order(&self, order: NewOrder) -> Result<OrderId>;

    /// Set an order's priority and append a matching change record, as one
    /// atomic unit. Fails with `OrderNotFound` if the order does not exist,
    /// leaving nothing committed.
    fn escalate_priority(&self, order_id: OrderId, priority: Priority) -> Result<ChangeId>;

    /// Fetch an order by id
    fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Fetch a priority-change record by id
    fn get_change(&self, id: ChangeId) -> Result<Option<PriorityChange>>;

    /// Read the current watermark (highest fully processed change id)
    fn watermark(&self) -> Result<ChangeId>;
}
