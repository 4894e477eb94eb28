#![forbid(unsafe_code)]

//! JSON log output for hosts that do not install their own subscriber.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "WEBCOMP_LOG";

/// Install a global JSON `fmt` subscriber filtered by `WEBCOMP_LOG`
/// (default `info`). Returns `false` if a global subscriber already exists.
pub fn init_json_logging() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok()
}
