use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "STUDY_LOG";

/// Install the global subscriber: `STUDY_LOG` filter (default `info`) and a
/// fmt layer on stderr so command output on stdout stays clean.
///
/// Calling it again is a no-op.
pub fn init_tracing() {
    let directives = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
