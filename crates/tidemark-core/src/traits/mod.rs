pub mod poll;
pub mod store;

pub use poll::{PollSource, PollTxn};
pub use store::OrderStore;
