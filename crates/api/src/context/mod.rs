//! Application context - dependency injection container
//!
//! Exactly one dispatcher (and with it one circuit breaker), one offline
//! queue and one connectivity listener exist per context. Everything that
//! needs them receives an `Arc` from here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use friendsync_core::{
    CacheInvalidationObserver, FriendMutationService, KeyValueStore, MutationDispatcher,
    NetworkMonitor, OfflineQueue, OperationExecutor,
};
use friendsync_domain::FriendSyncConfig;
use friendsync_infra::{
    init_tracing, ConfigLoader, ConnectivityListener, FileKeyValueStore, InMemoryKeyValueStore,
    MokaCacheStore,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: FriendSyncConfig,
    pub cache: Arc<MokaCacheStore>,
    pub network: Arc<dyn NetworkMonitor>,
    pub dispatcher: Arc<MutationDispatcher>,
    pub queue: Arc<OfflineQueue>,
    pub mutations: Arc<FriendMutationService>,

    listener: Mutex<ConnectivityListener>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Create a context from `.env`, config file and environment
    ///
    /// Also installs the global tracing subscriber.
    pub async fn from_env(
        executor: Arc<dyn OperationExecutor>,
        network: Arc<dyn NetworkMonitor>,
    ) -> anyhow::Result<Self> {
        let dotenv = dotenvy::dotenv();

        let config = ConfigLoader::new().load().context("failed to load configuration")?;
        init_tracing(&config.logging).context("failed to initialise tracing")?;

        match dotenv {
            Ok(path) => info!(path = %path.display(), "dotenv_loaded"),
            Err(e) => debug!(error = %e, "dotenv_not_loaded"),
        }

        Self::build(config, executor, network).await
    }

    /// Create a context from an explicit configuration
    ///
    /// The connectivity listener is started before this returns and a
    /// restored queue is drained once if the device is already online.
    pub async fn build(
        config: FriendSyncConfig,
        executor: Arc<dyn OperationExecutor>,
        network: Arc<dyn NetworkMonitor>,
    ) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;

        let store: Arc<dyn KeyValueStore> = match &config.queue.storage_path {
            Some(path) => {
                info!(path = %path, "queue_store_file");
                Arc::new(FileKeyValueStore::new(PathBuf::from(path)))
            }
            None => {
                warn!("queue_store_in_memory");
                Arc::new(InMemoryKeyValueStore::new())
            }
        };

        let cache = Arc::new(MokaCacheStore::default());

        let dispatcher = Arc::new(
            MutationDispatcher::from_settings(executor, &config.retry, &config.breaker)
                .context("failed to build mutation dispatcher")?,
        );

        let queue = Arc::new(
            OfflineQueue::load(store, dispatcher.clone(), Arc::clone(&network), &config.queue)
                .await
                .with_observer(Arc::new(CacheInvalidationObserver::new(cache.clone()))),
        );

        let mutations =
            Arc::new(FriendMutationService::new(cache.clone(), dispatcher.clone(), queue.clone()));

        let mut listener = ConnectivityListener::new(
            queue.clone(),
            Arc::clone(&network),
            config.network.poll_interval(),
        );
        listener.start().context("failed to start connectivity listener")?;

        if queue.get_queued_count() > 0 {
            let report = listener.notify_resume().await;
            info!(
                delivered = report.delivered,
                remaining = report.remaining,
                "startup_queue_drain"
            );
        }

        info!(queued = queue.get_queued_count(), online = network.is_connected(), "app_context_ready");

        Ok(Self {
            config,
            cache,
            network,
            dispatcher,
            queue,
            mutations,
            listener: Mutex::new(listener),
        })
    }

    /// The app returned to the foreground
    pub async fn resume(&self) -> friendsync_core::DrainReport {
        self.listener.lock().await.notify_resume().await
    }

    pub async fn is_listening(&self) -> bool {
        self.listener.lock().await.is_running()
    }

    /// Stop background work
    ///
    /// Idempotent. Queued entries stay persisted for the next start.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        info!(queued = self.queue.get_queued_count(), "shutdown called on AppContext");

        let mut listener = self.listener.lock().await;
        if listener.is_running() {
            listener.stop().await.context("failed to stop connectivity listener")?;
        }

        info!(component = "ConnectivityListener", cleanup_method = "CancellationToken + join", "service_cleanup");
        Ok(())
    }
}
