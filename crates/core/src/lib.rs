//! # FriendSync Core
//!
//! Delivery logic for friend mutations - no infrastructure dependencies.
//!
//! This crate contains:
//! - Failure classification (`errors`)
//! - Dispatch through circuit breaker and retry, and the offline queue
//!   (`delivery`)
//! - Optimistic cache reconciliation (`optimistic`)
//! - The mutation service tying them together (`mutations`)
//!
//! ## Architecture Principles
//! - Depends only on `friendsync-common` and `friendsync-domain`
//! - Storage, cache, network and backend access go through port traits
//! - No global state: one queue and one breaker are built and injected

pub mod delivery;
pub mod errors;
pub mod mutations;
pub mod optimistic;

pub use delivery::{
    DeliveryObserver, DrainReport, KeyValueStore, MutationDispatcher, NetworkMonitor,
    OfflineQueue, OperationDispatcher, OperationExecutor, RetryMode,
};
pub use errors::{classify, ClassifiedError, ErrorCategory, FriendsError, Result};
pub use mutations::{FriendMutationService, MutationFailure, MutationOutcome};
pub use optimistic::{
    CacheInvalidationObserver, CacheStore, OptimisticTransaction, OptimisticUpdate,
};
