//! Connectivity snapshot

use serde::{Deserialize, Serialize};

/// Whether the device can currently reach the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub connected: bool,
}

impl NetworkStatus {
    pub const fn online() -> Self {
        Self { connected: true }
    }

    pub const fn offline() -> Self {
        Self { connected: false }
    }
}
