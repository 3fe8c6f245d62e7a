//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "imagine_gate=info";

/// Initialize tracing. Users can install their own subscriber; this helper
/// installs an env-based fmt subscriber if none is set.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Like [`init_tracing`] but at debug level for this crate, mirroring the
/// `--debug` switch of the bot front end.
pub fn init_tracing_debug() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("imagine_gate=debug"))
        .try_init();
}
