pub mod change;
pub mod order;

pub use change::{ChangeId, PriorityChange};
pub use order::{NewOrder, Order, OrderId, Priority};
