use super::order::{OrderId, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority-change identifier - strictly monotonic in insertion order
pub type ChangeId = i64;

/// A durable record of a priority escalation against an order.
///
/// Appended by the ingress path in the same transaction that mutates the
/// order's priority; `processed` is flipped to true by the poller exactly
/// once and never reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityChange {
    pub id: ChangeId,
    pub order_id: OrderId,
    pub priority: Priority,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}
