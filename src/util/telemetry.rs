//! Telemetry helpers for structured logging and tracing.

/// Installs a default `RUST_LOG`-driven fmt subscriber unless the caller has
/// already set a global dispatcher. Safe to call from multiple tests or
/// binaries; only the first installation wins.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
