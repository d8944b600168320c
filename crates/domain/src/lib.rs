//! # FriendSync Domain
//!
//! Domain types for social friend mutations and their delivery.
//!
//! This crate contains:
//! - Friend mutations (`FriendOperation`) and their persisted queue form
//! - The cached social model (friends, requests, blocks, relationship status)
//! - Domain error types and Result definitions
//! - Configuration structures and defaults
//!
//! ## Architecture
//! - No dependencies on other FriendSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
