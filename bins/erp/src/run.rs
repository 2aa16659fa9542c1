use std::sync::Arc;
use std::time::Duration;

use prodmon_api::SystemClock;
use prodmon_pipeline::Catalog;
use service_http::{ErpState, erp_router};

use crate::config::Cli;
use crate::error::ErpError;

pub async fn run(cli: Cli) -> Result<(), ErpError> {
    let catalog = match &cli.catalog {
        Some(path) => {
            let catalog = Catalog::load(path)?;
            tracing::info!(path = %path, products = catalog.len(), "loaded catalog");
            catalog
        }
        None => Catalog::default(),
    };
    for entry in catalog.entries() {
        tracing::debug!(product_id = entry.product_id, product = %entry.product_name, target = %entry.target_time, "catalog entry");
    }

    let app = erp_router(ErpState {
        catalog: Arc::new(catalog),
        clock: Arc::new(SystemClock),
    });

    service_http::serve_until_signal(&cli.bind, cli.port, app, Duration::from_secs(5))
        .await
        .map_err(ErpError::Server)
}
