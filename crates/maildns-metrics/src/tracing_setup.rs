//! Tracing and logging setup.

use maildns_config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text format.
    Text,

    /// JSON format.
    Json,
}

impl LogFormat {
    /// Returns the format named by the logging configuration.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if config.is_json() {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Builds the filter: `RUST_LOG` when set, otherwise `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so command output on stdout stays parseable. Calling
/// this twice is harmless; the second call leaves the first subscriber in
/// place.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = env_filter(&config.level);

    let result = match LogFormat::from_config(config) {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if let Err(error) = result {
        tracing::debug!(%error, "tracing subscriber already installed");
    }
}
