//! Friend mutations and their queued form
//!
//! A [`FriendOperation`] is the kind and payload of one user-initiated
//! mutation in a single value. Its equality is the deduplication identity of
//! the offline queue.
//!
//! [`QueuedOperation`] persists as
//! `{ "id", "type", "payload", "timestamp", "retries" }` with camelCase
//! payload fields.

use chrono::Utc;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{DomainError, Result};
use crate::impl_domain_status_conversions;

/// Mutation kind, persisted as the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    SendRequest,
    Accept,
    Reject,
    CancelRequest,
    Unfriend,
    Block,
    Unblock,
}

impl_domain_status_conversions!(OperationKind {
    SendRequest => "send_request",
    Accept => "accept",
    Reject => "reject",
    CancelRequest => "cancel_request",
    Unfriend => "unfriend",
    Block => "block",
    Unblock => "unblock",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestPayload {
    pub receiver_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload for mutations addressed at an existing friend request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendPayload {
    pub friend_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPayload {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub user_id: String,
}

/// One friend mutation: kind and payload together
///
/// Serializes as the bare payload object; the kind travels separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FriendOperation {
    SendRequest(SendRequestPayload),
    Accept(RequestPayload),
    Reject(RequestPayload),
    CancelRequest(RequestPayload),
    Unfriend(FriendPayload),
    Block(BlockPayload),
    Unblock(UserPayload),
}

impl FriendOperation {
    pub fn send_request(receiver_id: impl Into<String>, message: Option<String>) -> Self {
        Self::SendRequest(SendRequestPayload { receiver_id: receiver_id.into(), message })
    }

    pub fn accept(request_id: impl Into<String>) -> Self {
        Self::Accept(RequestPayload { request_id: request_id.into() })
    }

    pub fn reject(request_id: impl Into<String>) -> Self {
        Self::Reject(RequestPayload { request_id: request_id.into() })
    }

    pub fn cancel_request(request_id: impl Into<String>) -> Self {
        Self::CancelRequest(RequestPayload { request_id: request_id.into() })
    }

    pub fn unfriend(friend_id: impl Into<String>) -> Self {
        Self::Unfriend(FriendPayload { friend_id: friend_id.into() })
    }

    pub fn block(user_id: impl Into<String>, reason: Option<String>) -> Self {
        Self::Block(BlockPayload { user_id: user_id.into(), reason })
    }

    pub fn unblock(user_id: impl Into<String>) -> Self {
        Self::Unblock(UserPayload { user_id: user_id.into() })
    }

    /// Rebuild an operation from its persisted kind and payload
    pub fn from_parts(kind: OperationKind, payload: Value) -> Result<Self> {
        let operation = match kind {
            OperationKind::SendRequest => Self::SendRequest(decode(kind, payload)?),
            OperationKind::Accept => Self::Accept(decode(kind, payload)?),
            OperationKind::Reject => Self::Reject(decode(kind, payload)?),
            OperationKind::CancelRequest => Self::CancelRequest(decode(kind, payload)?),
            OperationKind::Unfriend => Self::Unfriend(decode(kind, payload)?),
            OperationKind::Block => Self::Block(decode(kind, payload)?),
            OperationKind::Unblock => Self::Unblock(decode(kind, payload)?),
        };
        operation.validate()?;
        Ok(operation)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::SendRequest(_) => OperationKind::SendRequest,
            Self::Accept(_) => OperationKind::Accept,
            Self::Reject(_) => OperationKind::Reject,
            Self::CancelRequest(_) => OperationKind::CancelRequest,
            Self::Unfriend(_) => OperationKind::Unfriend,
            Self::Block(_) => OperationKind::Block,
            Self::Unblock(_) => OperationKind::Unblock,
        }
    }

    /// The user or request id the mutation is addressed at
    pub fn target_id(&self) -> &str {
        match self {
            Self::SendRequest(p) => &p.receiver_id,
            Self::Accept(p) | Self::Reject(p) | Self::CancelRequest(p) => &p.request_id,
            Self::Unfriend(p) => &p.friend_id,
            Self::Block(p) => &p.user_id,
            Self::Unblock(p) => &p.user_id,
        }
    }

    /// Reject operations whose target id is blank
    pub fn validate(&self) -> Result<()> {
        if self.target_id().trim().is_empty() {
            return Err(DomainError::InvalidPayload(format!(
                "{} requires a non-empty target id",
                self.kind()
            )));
        }
        Ok(())
    }

    /// Payload as a JSON object
    pub fn payload(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn decode<T: serde::de::DeserializeOwned>(kind: OperationKind, payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| DomainError::InvalidPayload(format!("{kind} payload: {e}")))
}

/// A mutation waiting in the offline queue
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "PersistedOperation")]
pub struct QueuedOperation {
    pub id: String,
    pub operation: FriendOperation,
    /// Milliseconds since the Unix epoch
    pub enqueued_at: i64,
    pub retries: u32,
}

impl QueuedOperation {
    /// New entry with a fresh id and zero retries
    pub fn new(operation: FriendOperation, enqueued_at: i64) -> Self {
        Self { id: Uuid::new_v4().to_string(), operation, enqueued_at, retries: 0 }
    }

    /// New entry stamped with the current wall-clock time
    pub fn now(operation: FriendOperation) -> Self {
        Self::new(operation, Utc::now().timestamp_millis())
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }
}

#[derive(Serialize)]
struct PersistedOperationRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: OperationKind,
    payload: &'a FriendOperation,
    timestamp: i64,
    retries: u32,
}

#[derive(Deserialize)]
struct PersistedOperation {
    id: String,
    #[serde(rename = "type")]
    kind: OperationKind,
    payload: Value,
    timestamp: i64,
    #[serde(default)]
    retries: u32,
}

impl Serialize for QueuedOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        PersistedOperationRef {
            id: &self.id,
            kind: self.operation.kind(),
            payload: &self.operation,
            timestamp: self.enqueued_at,
            retries: self.retries,
        }
        .serialize(serializer)
    }
}

impl TryFrom<PersistedOperation> for QueuedOperation {
    type Error = DomainError;

    fn try_from(raw: PersistedOperation) -> Result<Self> {
        Ok(Self {
            operation: FriendOperation::from_parts(raw.kind, raw.payload)?,
            id: raw.id,
            enqueued_at: raw.timestamp,
            retries: raw.retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Validates the persisted layout of a queued send request.
    ///
    /// Assertions:
    /// - Top-level keys are `id`, `type`, `payload`, `timestamp`, `retries`.
    /// - Payload fields are camelCase and absent options are omitted.
    #[test]
    fn test_queued_operation_persisted_layout() {
        let entry = QueuedOperation {
            id: "op-1".to_string(),
            operation: FriendOperation::send_request("user-42", None),
            enqueued_at: 1_700_000_000_000,
            retries: 2,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "op-1",
                "type": "send_request",
                "payload": { "receiverId": "user-42" },
                "timestamp": 1_700_000_000_000i64,
                "retries": 2
            })
        );
    }

    /// Validates decoding stored entries, including a missing retry count.
    #[test]
    fn test_queued_operation_decodes_stored_entry() {
        let stored = json!({
            "id": "op-7",
            "type": "block",
            "payload": { "userId": "user-9", "reason": "spam" },
            "timestamp": 5
        });

        let entry: QueuedOperation = serde_json::from_value(stored).unwrap();
        assert_eq!(entry.operation, FriendOperation::block("user-9", Some("spam".into())));
        assert_eq!(entry.retries, 0);
        assert_eq!(entry.kind(), OperationKind::Block);
    }

    /// Validates that a payload not matching its kind is rejected.
    #[test]
    fn test_mismatched_payload_is_rejected() {
        let stored = json!({
            "id": "op-8",
            "type": "unfriend",
            "payload": { "requestId": "req-1" },
            "timestamp": 5,
            "retries": 0
        });

        let err = serde_json::from_value::<QueuedOperation>(stored).unwrap_err();
        assert!(err.to_string().contains("unfriend payload"));
    }

    /// Validates the deduplication identity.
    ///
    /// Assertions:
    /// - Same kind and payload compare equal.
    /// - Same payload under a different kind does not.
    #[test]
    fn test_operation_identity() {
        assert_eq!(FriendOperation::accept("req-1"), FriendOperation::accept("req-1"));
        assert_ne!(FriendOperation::accept("req-1"), FriendOperation::reject("req-1"));
        assert_ne!(
            FriendOperation::send_request("u1", Some("hi".into())),
            FriendOperation::send_request("u1", None)
        );
    }

    #[test]
    fn test_blank_target_fails_validation() {
        assert!(FriendOperation::unfriend("  ").validate().is_err());
        assert!(FriendOperation::from_parts(OperationKind::Accept, json!({ "requestId": "" })).is_err());
        assert_eq!(FriendOperation::unblock("user-3").target_id(), "user-3");
    }
}
