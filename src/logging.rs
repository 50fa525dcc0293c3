//! tracing-subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// `RUST_LOG` wins over the configured level. The HTTP stack is held at
/// `warn` unless asked for explicitly.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = format!("{},hyper=warn,reqwest=warn,h2=warn", config.level);
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global subscriber, writing to stderr so stdout stays free for
/// command output. Later calls are ignored.
pub fn init(config: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr);
    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Subscriber for the short window before the configuration is known, so
/// the config lookup itself is logged. Uses the default logging settings.
pub fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&LoggingConfig::default()))
        .with_writer(std::io::stderr)
        .finish()
}
