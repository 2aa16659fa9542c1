use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use prodmon_api::{EventHandler, Subscription};

use crate::delivery::deliver;

pub const MONITOR_ROUTE: &str = "/monitor";

#[derive(Clone)]
pub struct MonitoringState {
    pub detector: Arc<dyn EventHandler>,
    pub pubsub_name: String,
    pub topic: String,
}

pub fn monitoring_router(state: MonitoringState) -> Router {
    Router::new()
        .route("/", get(|| async { "This is the Monitoring service!" }))
        .route("/dapr/subscribe", get(handle_subscribe))
        .route(MONITOR_ROUTE, post(handle_monitor))
        .with_state(state)
}

async fn handle_subscribe(State(state): State<MonitoringState>) -> Json<Vec<Subscription>> {
    Json(vec![Subscription::new(state.pubsub_name, state.topic, MONITOR_ROUTE)])
}

async fn handle_monitor(State(state): State<MonitoringState>, body: Bytes) -> Response {
    deliver(MONITOR_ROUTE, &*state.detector, &body).await
}
