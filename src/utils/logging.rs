use tracing_subscriber::EnvFilter;

/// Default directive used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "library_explorer=info";

/// Installs the global fmt subscriber for a host application.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is harmless:
/// only the first call installs a subscriber.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Logging initialized");
    }
}
