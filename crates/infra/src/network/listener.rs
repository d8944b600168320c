//! Connectivity listener that drains the offline queue on reconnect.
//!
//! The listener owns one background task. For monitors with a status channel
//! it reacts to every pushed change; passive monitors are polled at a fixed
//! interval. Each offline → online transition triggers one
//! [`OfflineQueue::process_queue`] call. A drain in flight is interrupted by
//! cancellation; the interrupted head keeps its retry count and is delivered
//! by a later drain. `stop` aborts the task if it outlives the join timeout,
//! so no task is left behind.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use friendsync_core::OfflineQueue;
//! use friendsync_infra::network::{ConnectivityListener, PlatformNetworkMonitor};
//!
//! # async fn example(queue: Arc<OfflineQueue>) -> friendsync_infra::InfraResult<()> {
//! let monitor = Arc::new(PlatformNetworkMonitor::new(false));
//! let mut listener = ConnectivityListener::new(queue, monitor.clone(), Duration::from_secs(5));
//!
//! listener.start()?;
//! monitor.set_connected(true); // queue drains in the background
//! listener.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use friendsync_core::{DrainReport, NetworkMonitor, OfflineQueue};
use friendsync_domain::NetworkStatus;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::errors::{InfraError, InfraResult};

const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Background task draining the queue whenever connectivity returns
pub struct ConnectivityListener {
    queue: Arc<OfflineQueue>,
    network: Arc<dyn NetworkMonitor>,
    poll_interval: Duration,
    join_timeout: Duration,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ConnectivityListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityListener")
            .field("poll_interval", &self.poll_interval)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl ConnectivityListener {
    pub fn new(
        queue: Arc<OfflineQueue>,
        network: Arc<dyn NetworkMonitor>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            network,
            poll_interval,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    pub fn with_join_timeout(mut self, join_timeout: Duration) -> Self {
        self.join_timeout = join_timeout;
        self
    }

    /// Spawn the background task
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> InfraResult<()> {
        if self.is_running() {
            return Err(InfraError::Lifecycle("connectivity listener already running".into()));
        }

        self.cancellation = CancellationToken::new();
        let queue = Arc::clone(&self.queue);
        let cancel = self.cancellation.clone();

        // The baseline is taken here so a change right after `start` returns
        // is seen as a transition.
        let handle = match self.network.subscribe() {
            Some(mut rx) => {
                let was_connected = rx.borrow_and_update().connected;
                info!(was_connected, "connectivity_listener_started_push");
                tokio::spawn(watch_loop(queue, rx, was_connected, cancel))
            }
            None => {
                let was_connected = self.network.is_connected();
                info!(
                    was_connected,
                    poll_ms = self.poll_interval.as_millis() as u64,
                    "connectivity_listener_started_poll"
                );
                let network = Arc::clone(&self.network);
                tokio::spawn(poll_loop(queue, network, self.poll_interval, was_connected, cancel))
            }
        };

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Cancel the background task and wait for it to finish
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> InfraResult<()> {
        let Some(mut handle) = self.task_handle.take() else {
            return Err(InfraError::Lifecycle("connectivity listener not running".into()));
        };

        self.cancellation.cancel();

        match tokio::time::timeout(self.join_timeout, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.cancellation = CancellationToken::new();
                warn!(error = %e, "connectivity_listener_task_failed");
                return Err(InfraError::Lifecycle("connectivity listener task panicked".into()));
            }
            Err(_) => {
                warn!("connectivity_listener_join_timeout_aborting");
                handle.abort();
                // Wait for the abort to land so nothing touches the queue afterwards.
                let _ = handle.await;
                self.cancellation = CancellationToken::new();
                return Err(InfraError::Lifecycle("connectivity listener did not stop in time".into()));
            }
        }

        info!("connectivity_listener_stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// App returned to the foreground: drain now if online
    pub async fn notify_resume(&self) -> DrainReport {
        if !self.network.is_connected() {
            debug!("app_resumed_offline");
            return DrainReport { skipped: true, remaining: self.queue.get_queued_count(), ..DrainReport::default() };
        }
        info!("app_resumed_draining_queue");
        self.queue.process_queue().await
    }
}

impl Drop for ConnectivityListener {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("connectivity_listener_dropped_while_running");
            self.cancellation.cancel();
        }
    }
}

async fn watch_loop(
    queue: Arc<OfflineQueue>,
    mut rx: watch::Receiver<NetworkStatus>,
    mut was_connected: bool,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("connectivity_listener_cancelled");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("network_monitor_closed");
                    break;
                }
                let connected = rx.borrow_and_update().connected;
                if connected && !was_connected && !drain_unless_cancelled(&queue, &cancel).await {
                    break;
                }
                was_connected = connected;
            }
        }
    }
}

async fn poll_loop(
    queue: Arc<OfflineQueue>,
    network: Arc<dyn NetworkMonitor>,
    poll_interval: Duration,
    mut was_connected: bool,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("connectivity_listener_cancelled");
                break;
            }
            _ = tokio::time::sleep(poll_interval) => {
                let connected = network.is_connected();
                if connected && !was_connected && !drain_unless_cancelled(&queue, &cancel).await {
                    break;
                }
                was_connected = connected;
            }
        }
    }
}

/// Returns `false` when cancellation interrupted the drain
async fn drain_unless_cancelled(queue: &OfflineQueue, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => {
            debug!(remaining = queue.get_queued_count(), "queue_drain_interrupted");
            false
        }
        () = drain(queue) => true,
    }
}

async fn drain(queue: &OfflineQueue) {
    info!(queued = queue.get_queued_count(), "network_restored_draining_queue");
    let report = queue.process_queue().await;
    debug!(
        delivered = report.delivered,
        dropped = report.dropped,
        remaining = report.remaining,
        stalled = report.stalled,
        "queue_drain_finished"
    );
}
