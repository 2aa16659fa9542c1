use std::sync::Arc;
use std::time::Duration;

use prodmon_api::{EnvelopeCodec, SystemClock};
use prodmon_pipeline::{Producer, spawn_producer};
use sidecar_client::{SidecarBroker, SidecarClient, SidecarConfig};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;
use crate::error::ProductionError;

pub async fn run(cli: Cli) -> Result<(), ProductionError> {
    if cli.max_product_id < 1 {
        return Err(ProductionError::Config(format!(
            "--max-product-id must be >= 1, got {}",
            cli.max_product_id
        )));
    }
    if cli.interval_secs == 0 {
        return Err(ProductionError::Config("--interval-secs must be > 0".into()));
    }

    let config = SidecarConfig::from(&cli.sidecar);
    tracing::info!(sidecar = %config.base_url, pubsub = %cli.broker.pubsub_name, topic = %cli.broker.topic, "production starting");
    let client = SidecarClient::new(config).map_err(|e| ProductionError::Client(e.to_string()))?;
    let broker = Arc::new(SidecarBroker::new(client, cli.broker.pubsub_name));

    let producer = Producer::new(
        broker,
        EnvelopeCodec::new(cli.source),
        Arc::new(SystemClock),
        cli.broker.topic,
        cli.max_product_id,
        cli.seed,
    );

    let token = CancellationToken::new();
    let handle = spawn_producer(producer, Duration::from_secs(cli.interval_secs), token.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down...");
    token.cancel();

    let published = handle.await?;
    tracing::info!(published, "production stopped");
    Ok(())
}
