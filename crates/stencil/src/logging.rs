//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr so they never mix with templates rendered to stdout.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive that overrides the
/// level picked from `-v`/`-q`.
pub const LOG_ENV: &str = "STENCIL_LOG";

/// Builds the filter: `STENCIL_LOG` if set and valid, otherwise `level`.
pub fn filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy()
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(level: LevelFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
