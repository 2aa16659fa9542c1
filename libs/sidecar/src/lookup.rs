use prodmon_api::{BoxFuture, CatalogProduct, MasterDataEntry, MasterDataLookup, MonitorError};
use reqwest::{Method, StatusCode};

use crate::client::SidecarClient;
use crate::retry::RetryPolicy;

/// Master-data lookup through service invocation of the catalog app.
pub struct SidecarLookup {
    client: SidecarClient,
    app_id: String,
    retry: RetryPolicy,
}

impl SidecarLookup {
    pub fn new(client: SidecarClient, app_id: impl Into<String>) -> Self {
        let retry = client.config().retry;
        Self {
            client,
            app_id: app_id.into(),
            retry,
        }
    }

    async fn fetch(&self, product_id: i64) -> Result<MasterDataEntry, MonitorError> {
        let url = self.client.invoke_url(&self.app_id, &format!("products/{product_id}"));
        let reply = self
            .client
            .send(self.client.request(Method::GET, &url))
            .await
            .map_err(|e| MonitorError::LookupUnavailable(format!("{}: {e}", self.app_id)))?;
        match reply.status {
            StatusCode::NOT_FOUND => Err(MonitorError::LookupNotFound(product_id)),
            s if s.is_success() => serde_json::from_slice::<CatalogProduct>(&reply.body)
                .map(CatalogProduct::into_entry)
                .map_err(|e| MonitorError::LookupUnavailable(format!("catalog response: {e}"))),
            s if s.is_client_error() => Err(MonitorError::LookupRejected {
                status: s.as_u16(),
                body: reply.body_text(),
            }),
            s => Err(MonitorError::LookupUnavailable(format!("status {s}: {}", reply.body_text()))),
        }
    }
}

impl MasterDataLookup for SidecarLookup {
    fn get_target(&self, product_id: i64) -> BoxFuture<'_, Result<MasterDataEntry, MonitorError>> {
        Box::pin(async move { self.retry.run("lookup", || self.fetch(product_id)).await })
    }
}
