use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};

use crate::config::SidecarConfig;

const TOKEN_HEADER: &str = "dapr-api-token";

/// Thin HTTP client for the sidecar's building-block endpoints.
///
/// Cheap to clone; every clone shares the connection pool.
#[derive(Clone)]
pub struct SidecarClient {
    http: reqwest::Client,
    config: Arc<SidecarConfig>,
}

/// Status and body of a completed call.
pub(crate) struct Reply {
    pub status: StatusCode,
    pub body: bytes::Bytes,
}

impl Reply {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl SidecarClient {
    pub fn new(config: SidecarConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &SidecarConfig {
        &self.config
    }

    pub fn publish_url(&self, pubsub: &str, topic: &str) -> String {
        format!("{}/v1.0/publish/{pubsub}/{topic}", self.config.base_url)
    }

    pub fn binding_url(&self, binding: &str) -> String {
        format!("{}/v1.0/bindings/{binding}", self.config.base_url)
    }

    pub fn invoke_url(&self, app_id: &str, method: &str) -> String {
        format!("{}/v1.0/invoke/{app_id}/method/{method}", self.config.base_url)
    }

    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.config.api_token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    /// Send and read the whole body. Transport failures (connect,
    /// deadline, reset) surface as `reqwest::Error`.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Reply, reqwest::Error> {
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        Ok(Reply { status, body })
    }
}
