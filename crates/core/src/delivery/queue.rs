//! Durable offline queue of friend mutations
//!
//! Entries are kept in FIFO order and persisted as one JSON array under a
//! fixed key after every change. At most one entry exists per operation.
//!
//! Draining is sequential and single-flight. The head entry is dispatched;
//! success removes it, failure bumps its retry counter. A head that reaches
//! the retry limit is dropped and draining continues, otherwise draining
//! stops and the remaining entries wait for the next trigger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use friendsync_domain::{FriendOperation, QueueConfig, QueuedOperation};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use super::ports::{DeliveryObserver, KeyValueStore, NetworkMonitor, OperationDispatcher};
use crate::errors::{classify, Result};

/// Summary of one `process_queue` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub dropped: usize,
    pub remaining: usize,
    /// Stopped early on a failure below the retry limit
    pub stalled: bool,
    /// Nothing ran: the queue was empty or another drain was in progress
    pub skipped: bool,
}

/// Clears the draining flag when dropped
struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Offline mutation queue
pub struct OfflineQueue {
    entries: Mutex<Vec<QueuedOperation>>,
    processing: AtomicBool,
    persist_lock: tokio::sync::Mutex<()>,
    store: Arc<dyn KeyValueStore>,
    dispatcher: Arc<dyn OperationDispatcher>,
    network: Arc<dyn NetworkMonitor>,
    observer: Option<Arc<dyn DeliveryObserver>>,
    storage_key: String,
    max_retries: u32,
}

impl std::fmt::Debug for OfflineQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineQueue")
            .field("storage_key", &self.storage_key)
            .field("max_retries", &self.max_retries)
            .field("queued", &self.get_queued_count())
            .finish_non_exhaustive()
    }
}

impl OfflineQueue {
    /// Construct the queue and load persisted entries
    ///
    /// A missing, unreadable or corrupt stored value yields an empty queue.
    /// Entries that fail to decode are skipped and duplicates are collapsed.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        dispatcher: Arc<dyn OperationDispatcher>,
        network: Arc<dyn NetworkMonitor>,
        config: &QueueConfig,
    ) -> Self {
        let entries = match store.get(&config.storage_key).await {
            Ok(Some(raw)) => decode_entries(&raw),
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(error = %error, key = %config.storage_key, "offline_queue_load_failed");
                Vec::new()
            }
        };

        if !entries.is_empty() {
            info!(count = entries.len(), "offline_queue_restored");
        }

        Self {
            entries: Mutex::new(entries),
            processing: AtomicBool::new(false),
            persist_lock: tokio::sync::Mutex::new(()),
            store,
            dispatcher,
            network,
            observer: None,
            storage_key: config.storage_key.clone(),
            max_retries: config.max_retries,
        }
    }

    /// Attach an observer for delivered and dropped entries
    pub fn with_observer(mut self, observer: Arc<dyn DeliveryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Enqueue an operation and return its entry id
    ///
    /// An identical pending operation is not duplicated; its id is returned.
    /// Persistence failures are logged, the entry stays queued in memory.
    /// When online, a drain runs before this returns.
    #[instrument(skip(self, operation), fields(kind = %operation.kind()))]
    pub async fn add(&self, operation: FriendOperation) -> Result<String> {
        operation.validate()?;

        let id = {
            let mut entries = self.entries.lock();
            if let Some(existing) = entries.iter().find(|entry| entry.operation == operation) {
                debug!(operation_id = %existing.id, "operation_already_queued");
                return Ok(existing.id.clone());
            }
            let entry = QueuedOperation::now(operation);
            let id = entry.id.clone();
            entries.push(entry);
            id
        };
        info!(operation_id = %id, "operation_enqueued");

        self.persist_or_log().await;

        if self.is_online() {
            self.process_queue().await;
        }

        Ok(id)
    }

    /// Drain the queue in FIFO order
    ///
    /// Never fails; the outcome is summarized in the returned report.
    #[instrument(skip(self))]
    pub async fn process_queue(&self) -> DrainReport {
        if self.entries.lock().is_empty() {
            return DrainReport { skipped: true, ..DrainReport::default() };
        }

        let Some(_guard) = DrainGuard::acquire(&self.processing) else {
            debug!("queue_drain_already_running");
            return DrainReport {
                skipped: true,
                remaining: self.get_queued_count(),
                ..DrainReport::default()
            };
        };

        let mut report = DrainReport::default();

        loop {
            let head = self.entries.lock().first().cloned();
            let Some(head) = head else { break };

            match self.dispatcher.dispatch(&head.operation).await {
                Ok(()) => {
                    if self.remove_entry(&head.id) {
                        self.persist_or_log().await;
                    }
                    report.delivered += 1;
                    info!(operation_id = %head.id, kind = %head.kind(), "queued_operation_delivered");
                    if let Some(observer) = &self.observer {
                        observer.on_delivered(&head);
                    }
                }
                Err(error) => {
                    let updated = {
                        let mut entries = self.entries.lock();
                        entries.iter_mut().find(|entry| entry.id == head.id).map(|entry| {
                            entry.retries += 1;
                            entry.clone()
                        })
                    };
                    // Cleared while the dispatch was in flight.
                    let Some(updated) = updated else { continue };

                    if updated.retries >= self.max_retries {
                        self.remove_entry(&updated.id);
                        self.persist_or_log().await;
                        report.dropped += 1;
                        let classified = classify(&error);
                        warn!(
                            operation_id = %updated.id,
                            kind = %updated.kind(),
                            retries = updated.retries,
                            category = %classified.category,
                            error = %error,
                            "queued_operation_dropped"
                        );
                        if let Some(observer) = &self.observer {
                            observer.on_dropped(&updated, &error);
                        }
                        continue;
                    }

                    self.persist_or_log().await;
                    report.stalled = true;
                    warn!(
                        operation_id = %updated.id,
                        retries = updated.retries,
                        error = %error,
                        "queue_drain_stalled"
                    );
                    break;
                }
            }
        }

        report.remaining = self.get_queued_count();
        report
    }

    pub fn get_queued_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Snapshot of the pending entries in delivery order
    pub fn get_queue(&self) -> Vec<QueuedOperation> {
        self.entries.lock().clone()
    }

    /// Remove every pending entry
    pub async fn clear_queue(&self) -> Result<()> {
        let cleared = std::mem::take(&mut *self.entries.lock());
        info!(count = cleared.len(), "offline_queue_cleared");
        self.persist().await
    }

    pub fn is_online(&self) -> bool {
        self.network.is_connected()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    fn remove_entry(&self, id: &str) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Write the current entries to the store
    ///
    /// The snapshot is taken after acquiring the write lock so concurrent
    /// writers always finish with the latest state.
    async fn persist(&self) -> Result<()> {
        let _write = self.persist_lock.lock().await;
        let snapshot = self.entries.lock().clone();
        let json = serde_json::to_string(&snapshot)?;
        self.store.set(&self.storage_key, &json).await
    }

    async fn persist_or_log(&self) {
        if let Err(error) = self.persist().await {
            warn!(error = %error, key = %self.storage_key, "offline_queue_persist_failed");
        }
    }
}

fn decode_entries(raw: &str) -> Vec<QueuedOperation> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(error) => {
            warn!(error = %error, "offline_queue_corrupt");
            return Vec::new();
        }
    };

    let mut entries: Vec<QueuedOperation> = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<QueuedOperation>(value) {
            Ok(entry) if entries.iter().any(|e| e.operation == entry.operation) => {
                debug!(operation_id = %entry.id, "offline_queue_duplicate_skipped");
            }
            Ok(entry) => entries.push(entry),
            Err(error) => warn!(error = %error, "offline_queue_entry_skipped"),
        }
    }
    entries
}
