use std::time::Duration;

use clap::Args;

use crate::retry::RetryPolicy;

/// Sidecar connection options shared by every service.
#[derive(Args, Clone, Debug)]
pub struct SidecarArgs {
    /// Sidecar scheme and host
    #[arg(long, default_value = "http://localhost", env = "DAPR_HOST")]
    pub dapr_host: String,

    /// Sidecar HTTP port
    #[arg(long, default_value_t = 3500, env = "DAPR_HTTP_PORT")]
    pub dapr_http_port: u16,

    /// API token sent as `dapr-api-token` (omitted when empty)
    #[arg(long, default_value = "", env = "DAPR_API_TOKEN", hide_env_values = true)]
    pub dapr_api_token: String,

    /// Deadline for a single outbound call, in milliseconds
    #[arg(long, default_value_t = 3000, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Attempts per store/catalog call (1 = no retry)
    #[arg(long, default_value_t = 3, env = "RETRY_ATTEMPTS")]
    pub retry_attempts: u32,

    /// First retry delay in milliseconds, doubled on every further attempt
    #[arg(long, default_value_t = 200, env = "RETRY_BACKOFF_MS")]
    pub retry_backoff_ms: u64,
}

/// Pub/sub component and topic the event flows through.
#[derive(Args, Clone, Debug)]
pub struct BrokerArgs {
    /// Pub/sub component name
    #[arg(long, default_value = "pubsub-redis", env = "PUBSUB_NAME")]
    pub pubsub_name: String,

    /// Topic carrying "product created" events
    #[arg(long, default_value = "products", env = "TOPIC")]
    pub topic: String,
}

/// Resolved sidecar configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct SidecarConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl SidecarConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            timeout: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&SidecarArgs> for SidecarConfig {
    fn from(args: &SidecarArgs) -> Self {
        let host = args.dapr_host.trim_end_matches('/');
        Self {
            base_url: format!("{host}:{}", args.dapr_http_port),
            api_token: Some(args.dapr_api_token.clone()).filter(|t| !t.is_empty()),
            timeout: Duration::from_millis(args.request_timeout_ms),
            retry: RetryPolicy::exponential(
                args.retry_attempts,
                Duration::from_millis(args.retry_backoff_ms),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        sidecar: SidecarArgs,
    }

    #[test]
    fn defaults_match_local_sidecar() {
        let cli = Cli::parse_from(["svc"]);
        let config = SidecarConfig::from(&cli.sidecar);
        assert_eq!(config.base_url, "http://localhost:3500");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.retry.attempts, 3);
    }

    #[test]
    fn empty_token_is_not_sent() {
        let cli = Cli::parse_from(["svc", "--dapr-host", "http://sidecar/", "--dapr-api-token", ""]);
        let config = SidecarConfig::from(&cli.sidecar);
        assert_eq!(config.base_url, "http://sidecar:3500");
        assert!(config.api_token.is_none());

        let cli = Cli::parse_from(["svc", "--dapr-api-token", "s3cret"]);
        assert_eq!(SidecarConfig::from(&cli.sidecar).api_token.as_deref(), Some("s3cret"));
    }
}
