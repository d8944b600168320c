//! Connectivity monitoring and reconnect-driven queue draining

pub mod listener;
pub mod monitor;

pub use listener::ConnectivityListener;
pub use monitor::{ConnectivityFlag, PlatformNetworkMonitor};
