//! Subscriber setup for the console.

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`.
///
/// `default_directive` applies when `RUST_LOG` is unset or invalid. Calling
/// this twice is harmless; the second install is ignored.
#[cfg(feature = "trace")]
pub fn init(default_directive: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(not(feature = "trace"))]
pub fn init(_default_directive: &str) {}
