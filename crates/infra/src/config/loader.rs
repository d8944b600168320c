//! Configuration loader
//!
//! Builds a [`FriendSyncConfig`] in layers.
//!
//! ## Loading Strategy
//! 1. Start from the built-in defaults
//! 2. Overlay a config file when one is given (explicitly or through
//!    `FRIENDSYNC_CONFIG_PATH`); keys missing from the file keep their
//!    defaults
//! 3. Overlay `FRIENDSYNC_*` environment variables
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `FRIENDSYNC_CONFIG_PATH`: Config file path (`.json` or `.toml`)
//! - `FRIENDSYNC_QUEUE_STORAGE_KEY`: Key the offline queue is persisted under
//! - `FRIENDSYNC_QUEUE_MAX_RETRIES`: Failed drains before an entry is dropped
//! - `FRIENDSYNC_QUEUE_STORAGE_PATH`: File backing the key-value store
//! - `FRIENDSYNC_RETRY_MAX_RETRIES`: Retries per dispatch
//! - `FRIENDSYNC_RETRY_BASE_DELAY_MS` / `FRIENDSYNC_RETRY_MAX_DELAY_MS`
//! - `FRIENDSYNC_RETRY_JITTER_MS`: Upper bound of added jitter, `0` disables
//! - `FRIENDSYNC_RETRY_SKIP_NON_RETRYABLE`: Consult the classifier (true/false)
//! - `FRIENDSYNC_BREAKER_FAILURE_THRESHOLD` / `FRIENDSYNC_BREAKER_COOLDOWN_MS`
//! - `FRIENDSYNC_NETWORK_POLL_INTERVAL_MS`: Poll interval for passive monitors
//! - `FRIENDSYNC_LOG_FILTER` / `FRIENDSYNC_LOG_JSON`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use friendsync_domain::FriendSyncConfig;

use crate::errors::{InfraError, InfraResult};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "FRIENDSYNC_CONFIG_PATH";

/// Layered configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    use_env: bool,
}

impl ConfigLoader {
    /// Loader reading the file path and overrides from the environment
    pub fn new() -> Self {
        Self { path: None, use_env: true }
    }

    /// Use an explicit config file instead of `FRIENDSYNC_CONFIG_PATH`
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Skip the environment layer entirely
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load and validate the configuration
    ///
    /// # Errors
    /// Returns `InfraError::Config` if the file is missing or malformed, an
    /// environment value does not parse, or validation fails.
    pub fn load(&self) -> InfraResult<FriendSyncConfig> {
        let path = match (&self.path, self.use_env) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from),
            (None, false) => None,
        };

        let mut config = match path {
            Some(path) => load_from_file(&path)?,
            None => FriendSyncConfig::default(),
        };

        if self.use_env {
            apply_env_overrides(&mut config)?;
        }

        config.validate()?;
        tracing::debug!(?config, "configuration_loaded");
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load with the default strategy
pub fn load() -> InfraResult<FriendSyncConfig> {
    ConfigLoader::new().load()
}

/// Read a config file; format is detected by extension
///
/// # Errors
/// Returns `InfraError::Config` if the file cannot be read or parsed.
pub fn load_from_file(path: &Path) -> InfraResult<FriendSyncConfig> {
    if !path.exists() {
        return Err(InfraError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "loading_config_file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| InfraError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> InfraResult<FriendSyncConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| InfraError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| InfraError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(InfraError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Overlay every `FRIENDSYNC_*` variable that is set
pub fn apply_env_overrides(config: &mut FriendSyncConfig) -> InfraResult<()> {
    if let Some(key) = env_string("FRIENDSYNC_QUEUE_STORAGE_KEY") {
        config.queue.storage_key = key;
    }
    if let Some(v) = env_parse("FRIENDSYNC_QUEUE_MAX_RETRIES")? {
        config.queue.max_retries = v;
    }
    if let Some(path) = env_string("FRIENDSYNC_QUEUE_STORAGE_PATH") {
        config.queue.storage_path = Some(path);
    }

    if let Some(v) = env_parse("FRIENDSYNC_RETRY_MAX_RETRIES")? {
        config.retry.max_retries = v;
    }
    if let Some(v) = env_parse("FRIENDSYNC_RETRY_BASE_DELAY_MS")? {
        config.retry.base_delay_ms = v;
    }
    if let Some(v) = env_parse("FRIENDSYNC_RETRY_MAX_DELAY_MS")? {
        config.retry.max_delay_ms = v;
    }
    if let Some(v) = env_parse("FRIENDSYNC_RETRY_JITTER_MS")? {
        config.retry.jitter_ms = v;
    }
    config.retry.skip_non_retryable =
        env_bool("FRIENDSYNC_RETRY_SKIP_NON_RETRYABLE", config.retry.skip_non_retryable);

    if let Some(v) = env_parse("FRIENDSYNC_BREAKER_FAILURE_THRESHOLD")? {
        config.breaker.failure_threshold = v;
    }
    if let Some(v) = env_parse("FRIENDSYNC_BREAKER_COOLDOWN_MS")? {
        config.breaker.cooldown_ms = v;
    }

    if let Some(v) = env_parse("FRIENDSYNC_NETWORK_POLL_INTERVAL_MS")? {
        config.network.poll_interval_ms = v;
    }

    if let Some(filter) = env_string("FRIENDSYNC_LOG_FILTER") {
        config.logging.filter = filter;
    }
    config.logging.json = env_bool("FRIENDSYNC_LOG_JSON", config.logging.json);

    Ok(())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> InfraResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| InfraError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
