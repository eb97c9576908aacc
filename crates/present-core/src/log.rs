//! Logging bootstrap for a library that lives inside someone else's process.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_VAR: &str = "PRESENT_UPSCALE_LOG";

static LOGGING: OnceCell<bool> = OnceCell::new();

/// Install a stderr fmt subscriber filtered by [`LOG_FILTER_VAR`].
///
/// Safe to call repeatedly. Returns `false` when the host already owns the
/// global subscriber, in which case our events go to theirs.
pub fn init_logging() -> bool {
    *LOGGING.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init()
            .is_ok()
    })
}
