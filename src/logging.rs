use tracing_subscriber::EnvFilter;

/// Install the global subscriber, tagging each line with the emitting thread
/// (`shop`, `producer`, `barber-N`). Logs go to stderr so stdout carries only
/// summaries. `default_filter` applies when `RUST_LOG` is unset.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
