use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::{LogFormat, LoggerConfig};

/// Maps a configured level name to a tracing level. `fatal` and `panic` have no tracing
/// counterpart and collapse into `error`; anything unknown falls back to `info`.
pub fn parse_log_level(level: &str) -> Level {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "fatal" | "panic" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `RUST_LOG` takes precedence over the configured level.
fn env_filter(config: &LoggerConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(parse_log_level(&config.level)).into())
        .from_env_lossy()
}

/// Installs the global subscriber. Calling it twice is a no-op for the second call.
pub fn init_tracing(config: &LoggerConfig) {
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer().with_target(true).boxed(),
    };

    let result = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter(config)))
        .try_init();

    if result.is_ok() {
        tracing::info!(
            component = "server",
            level = %config.level,
            format = ?config.format,
            "logger initialized"
        );
    }
}
