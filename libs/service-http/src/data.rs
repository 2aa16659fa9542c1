use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use prodmon_api::{EventHandler, Subscription};
use prodmon_pipeline::ProductRepository;

use crate::delivery::deliver;

pub const STORE_ROUTE: &str = "/store";

#[derive(Clone)]
pub struct DataState {
    pub consumer: Arc<dyn EventHandler>,
    pub repo: Arc<ProductRepository>,
    pub pubsub_name: String,
    pub topic: String,
    pub recent_limit: usize,
}

pub fn data_router(state: DataState) -> Router {
    Router::new()
        .route("/", get(|| async { "This is the Data service!" }))
        .route("/products", get(handle_recent))
        .route("/dapr/subscribe", get(handle_subscribe))
        .route(STORE_ROUTE, post(handle_store))
        .with_state(state)
}

async fn handle_recent(State(state): State<DataState>) -> Response {
    match state.repo.recent(state.recent_limit).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "listing products failed");
            (StatusCode::BAD_GATEWAY, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn handle_subscribe(State(state): State<DataState>) -> Json<Vec<Subscription>> {
    Json(vec![Subscription::new(state.pubsub_name, state.topic, STORE_ROUTE)])
}

async fn handle_store(State(state): State<DataState>, body: Bytes) -> Response {
    deliver(STORE_ROUTE, &*state.consumer, &body).await
}

#[cfg(test)]
mod tests {
    use binding_memory::MemoryBinding;
    use chrono::{TimeZone, Utc};
    use prodmon_api::{EnvelopeCodec, ProductionEvent};
    use prodmon_pipeline::PersistenceConsumer;

    use super::*;
    use crate::testing::{get, post, send};

    async fn app() -> (Arc<MemoryBinding>, Router) {
        let binding = Arc::new(MemoryBinding::new());
        let repo = Arc::new(ProductRepository::new(binding.clone()));
        repo.init_schema().await.unwrap();
        let state = DataState {
            consumer: Arc::new(PersistenceConsumer::new(EnvelopeCodec::new("production"), repo.clone())),
            repo,
            pubsub_name: "pubsub-redis".into(),
            topic: "products".into(),
            recent_limit: 10,
        };
        (binding, data_router(state))
    }

    fn envelope(product_id: i64, minute: u32) -> Vec<u8> {
        EnvelopeCodec::new("production")
            .encode(&ProductionEvent {
                product_id,
                created_at: Utc.with_ymd_and_hms(2026, 10, 17, 8, minute, 0).unwrap(),
            })
            .unwrap()
    }

    #[tokio::test]
    async fn identity_and_subscription() {
        let (_, app) = app().await;
        let (status, body) = send(app.clone(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "This is the Data service!");

        let (_, body) = send(app, get("/dapr/subscribe")).await;
        assert_eq!(
            body,
            serde_json::json!([{ "pubsubname": "pubsub-redis", "topic": "products", "route": "/store" }])
        );
    }

    #[tokio::test]
    async fn stored_events_are_listed_newest_first() {
        let (_, app) = app().await;
        for (id, minute) in [(1, 1), (2, 2), (1, 3)] {
            let (status, _) = send(app.clone(), post("/store", envelope(id, minute))).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        let (status, body) = send(app, get("/products")).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["id"], 3);
        assert_eq!(rows[0]["created_at"], "2026-10-17T08:03:00Z");
        assert_eq!(rows[2]["product_id"], 1);
    }

    #[tokio::test]
    async fn malformed_delivery_is_dropped() {
        let (binding, app) = app().await;
        let (status, body) = send(app, post("/store", "garbage")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "DROP");
        assert_eq!(binding.row_count("products").await, Some(0));
    }

    #[tokio::test]
    async fn store_outage_asks_for_retry() {
        let (binding, app) = app().await;
        binding.set_unavailable(true);

        let (status, body) = send(app.clone(), post("/store", envelope(1, 0))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "RETRY");

        let (status, body) = send(app, get("/products")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].is_string());
    }
}
