use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use prodmon_api::{CatalogProduct, Clock};
use prodmon_pipeline::Catalog;

#[derive(Clone)]
pub struct ErpState {
    pub catalog: Arc<Catalog>,
    pub clock: Arc<dyn Clock>,
}

/// Master-data lookup service. Targets are anchored to the current day.
pub fn erp_router(state: ErpState) -> Router {
    Router::new()
        .route("/", get(|| async { "This is the ERP service!" }))
        .route("/products", get(handle_list))
        .route("/products/{id}", get(handle_get))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

async fn handle_list(State(state): State<ErpState>) -> Json<Vec<CatalogProduct>> {
    let today = state.clock.today();
    Json(state.catalog.entries().map(|e| CatalogProduct::anchored(e, today)).collect())
}

async fn handle_get(State(state): State<ErpState>, Path(id): Path<String>) -> Response {
    let Ok(product_id) = id.parse::<i64>() else {
        return error(StatusCode::BAD_REQUEST, "Invalid product id, must be an integer.");
    };
    match state.catalog.get(product_id) {
        Some(entry) => Json(CatalogProduct::anchored(entry, state.clock.today())).into_response(),
        None => {
            tracing::debug!(product_id, "product not in catalog");
            error(StatusCode::NOT_FOUND, "Product not found.")
        }
    }
}
