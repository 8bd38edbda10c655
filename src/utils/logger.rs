use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Level comes from `RUST_LOG` (e.g. `RUST_LOG=little_ar=debug`), default `info`.
/// Calling this twice is harmless; the second install is ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
