//! Mutation delivery: dispatch through breaker and retry, and the offline
//! queue that holds mutations until they can be delivered.

pub mod dispatcher;
pub mod ports;
pub mod queue;

pub use dispatcher::{breaker_config, retry_config, MutationDispatcher, RetryMode};
pub use ports::{
    DeliveryObserver, KeyValueStore, NetworkMonitor, OperationDispatcher, OperationExecutor,
};
pub use queue::{DrainReport, OfflineQueue};
