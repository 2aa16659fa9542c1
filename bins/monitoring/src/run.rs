use std::sync::Arc;
use std::time::Duration;

use prodmon_api::{EnvelopeCodec, SystemClock};
use prodmon_pipeline::DelayDetector;
use service_http::{MonitoringState, monitoring_router};
use sidecar_client::{SidecarClient, SidecarConfig, SidecarLookup};

use crate::config::Cli;
use crate::error::MonitoringError;

pub async fn run(cli: Cli) -> Result<(), MonitoringError> {
    let config = SidecarConfig::from(&cli.sidecar);
    tracing::info!(
        sidecar = %config.base_url,
        erp = %cli.erp_app_id,
        anchor = %cli.anchor,
        "monitoring starting"
    );
    let client = SidecarClient::new(config).map_err(|e| MonitoringError::Client(e.to_string()))?;
    let lookup = Arc::new(SidecarLookup::new(client, cli.erp_app_id.clone()));

    let detector = DelayDetector::new(EnvelopeCodec::new("monitoring"), lookup, cli.anchor, Arc::new(SystemClock));
    let app = monitoring_router(MonitoringState {
        detector: Arc::new(detector),
        pubsub_name: cli.broker.pubsub_name,
        topic: cli.broker.topic,
    });

    service_http::serve_until_signal(&cli.bind, cli.port, app, Duration::from_secs(5))
        .await
        .map_err(MonitoringError::Server)
}
