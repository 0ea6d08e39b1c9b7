#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive, e.g. `taskcli=debug`.
pub const LOG_ENV: &str = "TASKCLI_LOG";

/// Installs a stderr subscriber. `TASKCLI_LOG` wins over `verbose`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
