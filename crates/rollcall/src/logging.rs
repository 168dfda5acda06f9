use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that prints to stderr.
///
/// Verbosity comes from `RUST_LOG` and defaults to `info`. Calling this
/// more than once is harmless; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
