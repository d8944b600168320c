//! # FriendSync Infrastructure
//!
//! Infrastructure implementations of core delivery ports.
//!
//! This crate contains:
//! - Key-value stores for the offline queue (file and in-memory)
//! - The `moka` query cache behind optimistic updates
//! - Network monitors and the reconnect listener
//! - Layered configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `friendsync-core`
//! - Contains all "impure" code (file I/O, background tasks, globals)

pub mod cache;
pub mod config;
pub mod errors;
pub mod network;
pub mod observability;
pub mod storage;

// Re-export commonly used items
pub use cache::MokaCacheStore;
pub use config::ConfigLoader;
pub use errors::{InfraError, InfraResult};
pub use network::{ConnectivityFlag, ConnectivityListener, PlatformNetworkMonitor};
pub use observability::init_tracing;
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore};
