use std::time::Duration;

use friendsync_core::MutationFailure;
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"friends::unfriend"`).
/// * `elapsed` - Duration the command execution took.
/// * `success` - Whether the command completed successfully.
/// * `error_type` - Stable failure label from [`error_label`], if any.
///
/// Callers must avoid forwarding user ids or message text in `command`.
#[inline]
pub fn log_command_execution(
    command: &str,
    elapsed: Duration,
    success: bool,
    error_type: Option<&str>,
) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, error_type, "command_execution_failure");
    }
}

/// Convert a mutation failure into a stable label suitable for logging.
#[inline]
pub fn error_label(failure: &MutationFailure) -> &'static str {
    failure.category().as_str()
}
