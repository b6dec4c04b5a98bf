use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup logging.
/// By default, it will only show logs from our crate at the info level.
///
/// The log level can be overridden by setting the `KNIFE_CLIENT_LOG` environment variable.
/// If the `KNIFE_CLIENT_LOG_ALL` environment variable is set, it will show logs from all crates at the specified level.
/// Passing `debug = true` (the hidden `--debug` flag) forces the debug level.
pub fn setup_logging(debug: bool) {
    // Get the log level from the flag or the environment variable.
    let log_level = if debug {
        "debug".to_string()
    } else {
        std::env::var("KNIFE_CLIENT_LOG").unwrap_or_else(|_| "info".to_string())
    };

    let show_all_logs = std::env::var("KNIFE_CLIENT_LOG_ALL").is_ok();

    // This will either be "log_level" or "knife_client=log_level".
    let filter = if show_all_logs {
        log_level
    } else {
        format!("knife_client={}", log_level)
    };

    // Logs go to stderr, stdout is reserved for command output.
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::new(filter))
        .init();
}
