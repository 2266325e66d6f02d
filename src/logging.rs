// 📝 Logging - tracing subscriber for the binaries

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `best_card=debug`)
pub const LOG_ENV: &str = "BESTCARD_LOG";

/// Install a stderr subscriber. `default_filter` applies when `BESTCARD_LOG` is unset.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
