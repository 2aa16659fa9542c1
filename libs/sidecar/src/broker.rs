use prodmon_api::envelope::CLOUDEVENTS_CONTENT_TYPE;
use prodmon_api::{BoxFuture, Broker, MonitorError};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;

use crate::client::SidecarClient;

/// Publishes envelopes through the sidecar's pub/sub endpoint.
///
/// No retry here: redelivery policy belongs to the producer.
pub struct SidecarBroker {
    client: SidecarClient,
    pubsub: String,
}

impl SidecarBroker {
    pub fn new(client: SidecarClient, pubsub: impl Into<String>) -> Self {
        Self {
            client,
            pubsub: pubsub.into(),
        }
    }
}

impl Broker for SidecarBroker {
    fn publish(&self, topic: &str, envelope: Vec<u8>) -> BoxFuture<'_, Result<(), MonitorError>> {
        let url = self.client.publish_url(&self.pubsub, topic);
        Box::pin(async move {
            let request = self
                .client
                .request(Method::POST, &url)
                .header(CONTENT_TYPE, CLOUDEVENTS_CONTENT_TYPE)
                .body(envelope);
            let reply = self
                .client
                .send(request)
                .await
                .map_err(|e| MonitorError::Transport(format!("publish {url}: {e}")))?;
            if !reply.status.is_success() {
                return Err(MonitorError::Transport(format!(
                    "publish {url}: status {}: {}",
                    reply.status,
                    reply.body_text()
                )));
            }
            Ok(())
        })
    }
}
