use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Sets up logging to stderr.
///
/// `RUST_LOG` wins when set. Otherwise `verbosity` picks the level: 0 is
/// `warn`, 1 is `debug`, anything higher is `trace`. Stdout is left to the
/// prompts and previews.
pub fn setup_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("seqren={default_level}")));

    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();

    tracing::debug!(verbosity, "logging initialized");
}
