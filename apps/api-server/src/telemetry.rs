//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,api_server=debug,blog_infra=debug";

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT` wins; otherwise production deployments log JSON.
    fn resolve(log_format: Option<&str>, rust_env: Option<&str>) -> Self {
        match log_format {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(_) => LogFormat::Pretty,
            None if rust_env.is_some_and(|env| env.eq_ignore_ascii_case("production")) => {
                LogFormat::Json
            }
            None => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Recorded on the startup event so aggregated logs can be told apart.
    pub service_name: String,
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let log_format = std::env::var("LOG_FORMAT").ok();
        let rust_env = std::env::var("RUST_ENV").ok();

        Self {
            format: LogFormat::resolve(log_format.as_deref(), rust_env.as_deref()),
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "blog-api".to_string()),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }

    tracing::info!(
        service = %config.service_name,
        format = ?config.format,
        "Telemetry initialized"
    );
}
