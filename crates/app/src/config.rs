//! Client configuration

use std::{path::PathBuf, time::Duration};

use clap::{Args, ValueEnum};

use pawcart_app::gateway::HttpGatewayConfig;

/// Backend and mirror settings.
#[derive(Debug, Args)]
pub(crate) struct BackendConfig {
    /// Shop API base URL
    #[arg(long, env = "PAWCART_API_URL", default_value = "http://127.0.0.1:5000/api")]
    pub api_url: String,

    /// Bearer token of the signed-in user
    #[arg(long, env = "PAWCART_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Directory holding the local coupon mirror and checkout handoff
    #[arg(long, env = "PAWCART_MIRROR_DIR", default_value = ".pawcart")]
    pub mirror_dir: PathBuf,

    /// Transport timeout for each backend request, in seconds
    #[arg(long, env = "PAWCART_HTTP_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub http_timeout_seconds: u64,
}

impl BackendConfig {
    /// Gateway settings; a blank token counts as signed out.
    pub(crate) fn gateway(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.api_url.clone(),
            token: self
                .api_token
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
            timeout: Duration::from_secs(self.http_timeout_seconds),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
