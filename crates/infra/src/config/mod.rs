//! Configuration loading
//!
//! Layers defaults, an optional file and environment variables into a
//! validated [`friendsync_domain::FriendSyncConfig`].

pub mod loader;

pub use loader::{apply_env_overrides, load, load_from_file, ConfigLoader, CONFIG_PATH_ENV};
