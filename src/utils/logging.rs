use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Initialize tracing for a consuming binary or test run.
///
/// `level` is an EnvFilter directive such as "info" or
/// "auth_token_cache=debug". Safe to call more than once; later calls are
/// no-ops.
pub fn init_logging(level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true)
                .with_ansi(false);

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer().compact().with_timer(UtcTime::rfc_3339()).with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}
