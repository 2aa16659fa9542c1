use std::sync::Arc;
use std::time::Duration;

use binding_memory::MemoryBinding;
use prodmon_api::{EnvelopeCodec, StoreGateway};
use prodmon_pipeline::{PersistenceConsumer, ProductRepository};
use service_http::{DataState, data_router};
use sidecar_client::{SidecarBinding, SidecarClient, SidecarConfig};

use crate::config::{Cli, StoreKind};
use crate::error::DataError;

pub async fn run(cli: Cli) -> Result<(), DataError> {
    let store: Arc<dyn StoreGateway> = match cli.store {
        StoreKind::Dapr => {
            let config = SidecarConfig::from(&cli.sidecar);
            tracing::info!(sidecar = %config.base_url, binding = %cli.binding, "using sidecar binding");
            let client = SidecarClient::new(config).map_err(|e| DataError::Client(e.to_string()))?;
            Arc::new(SidecarBinding::new(client, cli.binding.clone()))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store, records are lost on exit");
            Arc::new(MemoryBinding::new())
        }
    };

    let repo = Arc::new(ProductRepository::new(store));
    // Nothing can be stored without the table.
    repo.init_schema().await?;
    tracing::info!("products table ready");

    let consumer = PersistenceConsumer::new(EnvelopeCodec::new("data"), repo.clone());
    let app = data_router(DataState {
        consumer: Arc::new(consumer),
        repo,
        pubsub_name: cli.broker.pubsub_name,
        topic: cli.broker.topic,
        recent_limit: cli.recent_limit,
    });

    service_http::serve_until_signal(&cli.bind, cli.port, app, Duration::from_secs(5))
        .await
        .map_err(DataError::Server)
}
