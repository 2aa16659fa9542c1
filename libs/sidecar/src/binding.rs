use prodmon_api::{BoxFuture, MonitorError, Row, StoreCommand, StoreGateway};
use reqwest::Method;

use crate::client::{Reply, SidecarClient};
use crate::retry::RetryPolicy;

/// Store gateway over the sidecar's output-binding endpoint.
pub struct SidecarBinding {
    client: SidecarClient,
    binding: String,
    retry: RetryPolicy,
}

impl SidecarBinding {
    pub fn new(client: SidecarClient, binding: impl Into<String>) -> Self {
        let retry = client.config().retry;
        Self {
            client,
            binding: binding.into(),
            retry,
        }
    }

    async fn invoke_once(&self, command: &StoreCommand) -> Result<Reply, MonitorError> {
        let url = self.client.binding_url(&self.binding);
        let request = self.client.request(Method::POST, &url).json(command);
        let reply = self
            .client
            .send(request)
            .await
            .map_err(|e| MonitorError::StoreUnavailable(format!("{}: {e}", self.binding)))?;
        if !reply.status.is_success() {
            return Err(MonitorError::StoreRejected {
                status: reply.status.as_u16(),
                body: reply.body_text(),
            });
        }
        Ok(reply)
    }

    async fn invoke(&self, command: &StoreCommand) -> Result<Reply, MonitorError> {
        self.retry.run("store", || self.invoke_once(command)).await
    }
}

impl StoreGateway for SidecarBinding {
    fn exec(&self, command: StoreCommand) -> BoxFuture<'_, Result<(), MonitorError>> {
        Box::pin(async move {
            self.invoke(&command).await?;
            Ok(())
        })
    }

    fn query(&self, command: StoreCommand) -> BoxFuture<'_, Result<Vec<Row>, MonitorError>> {
        Box::pin(async move {
            let reply = self.invoke(&command).await?;
            if reply.body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Vec::new());
            }
            serde_json::from_slice::<Vec<Row>>(&reply.body)
                .map_err(|e| MonitorError::RowDecode(format!("query result is not a row array: {e}")))
        })
    }
}
