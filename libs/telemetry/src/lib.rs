//! Logging and metric helpers for the WhatsApp intake service.

use anyhow::Result;

mod config;
mod counters;
mod tracing_init;

pub use config::TelemetryConfig;
pub use counters::{
    WEBHOOK_FRAGMENTS_SKIPPED, WEBHOOK_MESSAGES_RECEIVED, WEBHOOK_VERIFICATIONS,
    record_verification, record_webhook_delivery,
};
pub use tracing_init::init_telemetry;

/// Installs the subscriber configured from `RUST_LOG`, `LOG_FORMAT` and
/// `OTEL_SERVICE_NAME`.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(
        service_name,
        env!("CARGO_PKG_VERSION"),
    ))
}
