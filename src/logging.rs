//! Structured logging for the tree-buffer engine.
//!
//! Separate from the `TAG count\n` statistics sink of [`crate::stats`]: this
//! module is for human/observability-facing structured events (the way the
//! host application keeps its `logging` module distinct from any one
//! specific statistics consumer), not for the stable wire format tooling
//! parses.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a process-wide `tracing` subscriber for the demo binary.
///
/// Library code never calls this; only binaries and examples should.
pub fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = fmt().with_env_filter(filter).with_target(true).finish();

    // A demo binary may call this more than once across test runs in the same
    // process; ignore the "already set" error rather than panicking.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
