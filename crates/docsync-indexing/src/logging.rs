//! Tracing initialisation.

use docsync_types::Settings;
use tracing_subscriber::EnvFilter;

use crate::error::IndexingError;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to the
/// configured log level. Fails if a global subscriber is already set.
pub fn init_tracing(settings: &Settings) -> Result<(), IndexingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| IndexingError::Logging(e.to_string()))
}
