//! User-facing friend mutations

pub mod service;

pub use service::{FriendMutationService, MutationFailure, MutationOutcome};
