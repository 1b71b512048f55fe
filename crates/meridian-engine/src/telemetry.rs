//! Tracing subscriber setup.
//!
//! ```text
//! MERIDIAN_LOG  ──► used if set and valid
//! RUST_LOG      ──► otherwise, if set and valid
//! [logging].filter from EngineConfig (default "info,meridian=debug,sqlx=warn")
//! ```

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "MERIDIAN_LOG";

/// Installs the global fmt subscriber. Calling it twice is a no-op.
pub fn init_tracing(settings: &LoggingSettings) {
    let filter = resolve_filter(settings);

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}

fn resolve_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&settings.filter))
}
