pub mod poller;
pub mod store;

pub use poller::PollerConfig;
pub use store::{StoreConfig, SynchronousMode};
