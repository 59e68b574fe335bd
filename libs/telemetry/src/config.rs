use std::env;

/// Logging settings resolved from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub json_logs: bool,
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str, default_service_version: &str) -> Self {
        Self::from_lookup(default_service_name, default_service_version, |key| {
            env::var(key).ok()
        })
    }

    /// Same as [`TelemetryConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(
        default_service_name: &str,
        default_service_version: &str,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_name = lookup("OTEL_SERVICE_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_service_name.to_string());
        let service_version = lookup("OTEL_SERVICE_VERSION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_service_version.to_string());
        let json_logs = lookup("LOG_FORMAT")
            .map(|v| !matches!(v.to_lowercase().as_str(), "text" | "pretty" | "plain"))
            .unwrap_or(true);

        Self {
            service_name,
            service_version,
            json_logs,
            default_filter: "info".into(),
        }
    }
}
