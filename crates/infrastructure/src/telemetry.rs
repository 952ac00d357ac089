//! Tracing initialization.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;

/// Configuration for tracing
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name reported in the startup log line
    pub service_name: String,
    /// Log filter level
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "person-service".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Initialize tracing. Returns false when a global subscriber was already
/// installed (tests initialize repeatedly).
pub fn init_tracing(config: &TelemetryConfig) -> bool {
    let env_filter = EnvFilter::new(&config.log_level);

    let logging_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stdout)
        .with_filter(env_filter);

    let subscriber = tracing_subscriber::Registry::default().with(logging_layer);
    let initialized = tracing::subscriber::set_global_default(subscriber).is_ok();

    if initialized {
        info!("Tracing initialized for service: {}", config.service_name);
    }

    initialized
}
