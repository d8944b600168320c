//! Friend mutation service - the public entry point for every mutation

use std::sync::Arc;

use friendsync_domain::FriendOperation;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::delivery::{OfflineQueue, OperationDispatcher};
use crate::errors::{classify, ClassifiedError, ErrorCategory, FriendsError};
use crate::optimistic::{CacheStore, OptimisticTransaction};

/// How a mutation was settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Confirmed by the backend
    Delivered,
    /// Parked in the offline queue; the tentative state stays visible
    Queued { operation_id: String },
}

/// A mutation that failed and was rolled back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{classified}")]
pub struct MutationFailure {
    pub classified: ClassifiedError,
}

impl MutationFailure {
    pub fn category(&self) -> ErrorCategory {
        self.classified.category
    }

    pub fn user_message(&self) -> &str {
        &self.classified.user_message
    }
}

impl From<&FriendsError> for MutationFailure {
    fn from(error: &FriendsError) -> Self {
        Self { classified: classify(error) }
    }
}

/// Friend mutation service
pub struct FriendMutationService {
    cache: Arc<dyn CacheStore>,
    dispatcher: Arc<dyn OperationDispatcher>,
    queue: Arc<OfflineQueue>,
}

impl FriendMutationService {
    /// Create a new mutation service
    pub fn new(
        cache: Arc<dyn CacheStore>,
        dispatcher: Arc<dyn OperationDispatcher>,
        queue: Arc<OfflineQueue>,
    ) -> Self {
        Self { cache, dispatcher, queue }
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Perform one mutation with optimistic local state
    ///
    /// Offline, behind a non-empty queue, or on a network/timeout failure,
    /// the mutation is queued and the tentative state kept. Any other failure rolls the cache back and
    /// returns the classified error.
    #[instrument(skip(self, operation), fields(kind = %operation.kind()))]
    pub async fn perform(
        &self,
        operation: FriendOperation,
    ) -> Result<MutationOutcome, MutationFailure> {
        if let Err(error) = operation.validate() {
            return Err(MutationFailure::from(&FriendsError::from(error)));
        }

        let txn = OptimisticTransaction::begin(Arc::clone(&self.cache), &operation);

        if !self.queue.is_online() {
            info!("mutation_deferred_offline");
            return self.enqueue(operation, txn).await;
        }

        // Earlier entries are delivered first.
        let pending = self.queue.get_queued_count();
        if pending > 0 {
            info!(pending, "mutation_deferred_behind_queue");
            return self.enqueue(operation, txn).await;
        }

        match self.dispatcher.dispatch(&operation).await {
            Ok(()) => {
                txn.commit();
                info!(target_id = operation.target_id(), "mutation_delivered");
                Ok(MutationOutcome::Delivered)
            }
            Err(error) => {
                let failure = MutationFailure::from(&error);
                if failure.category().is_queue_eligible() {
                    warn!(error = %error, category = %failure.category(), "mutation_deferred_after_failure");
                    return self.enqueue(operation, txn).await;
                }
                warn!(error = %error, category = %failure.category(), "mutation_failed");
                txn.rollback();
                Err(failure)
            }
        }
    }

    async fn enqueue(
        &self,
        operation: FriendOperation,
        txn: OptimisticTransaction,
    ) -> Result<MutationOutcome, MutationFailure> {
        match self.queue.add(operation).await {
            Ok(operation_id) => {
                txn.keep();
                Ok(MutationOutcome::Queued { operation_id })
            }
            Err(error) => {
                txn.rollback();
                Err(MutationFailure::from(&error))
            }
        }
    }

    pub async fn send_friend_request(
        &self,
        receiver_id: &str,
        message: Option<String>,
    ) -> Result<MutationOutcome, MutationFailure> {
        self.perform(FriendOperation::send_request(receiver_id, message)).await
    }

    pub async fn accept_friend_request(
        &self,
        request_id: &str,
    ) -> Result<MutationOutcome, MutationFailure> {
        self.perform(FriendOperation::accept(request_id)).await
    }

    pub async fn reject_friend_request(
        &self,
        request_id: &str,
    ) -> Result<MutationOutcome, MutationFailure> {
        self.perform(FriendOperation::reject(request_id)).await
    }

    pub async fn cancel_friend_request(
        &self,
        request_id: &str,
    ) -> Result<MutationOutcome, MutationFailure> {
        self.perform(FriendOperation::cancel_request(request_id)).await
    }

    pub async fn unfriend(&self, friend_id: &str) -> Result<MutationOutcome, MutationFailure> {
        self.perform(FriendOperation::unfriend(friend_id)).await
    }

    pub async fn block_user(
        &self,
        user_id: &str,
        reason: Option<String>,
    ) -> Result<MutationOutcome, MutationFailure> {
        self.perform(FriendOperation::block(user_id, reason)).await
    }

    pub async fn unblock_user(&self, user_id: &str) -> Result<MutationOutcome, MutationFailure> {
        self.perform(FriendOperation::unblock(user_id)).await
    }
}
