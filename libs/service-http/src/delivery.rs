use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prodmon_api::{Disposition, EventHandler, MonitorError};
use serde::Serialize;

/// Dispatcher-facing outcome of one delivery.
#[derive(Debug, Serialize)]
struct DeliveryReply {
    status: Disposition,
    error: String,
}

impl From<&MonitorError> for DeliveryReply {
    fn from(err: &MonitorError) -> Self {
        Self {
            status: err.disposition(),
            error: err.to_string(),
        }
    }
}

/// Run `handler` on the delivered body and translate the outcome.
/// 204 on success, 200 + DROP for poison messages, 500 + RETRY otherwise.
pub(crate) async fn deliver(route: &str, handler: &dyn EventHandler, body: &[u8]) -> Response {
    let err = match handler.handle(body).await {
        Ok(()) => return StatusCode::NO_CONTENT.into_response(),
        Err(e) => e,
    };
    let reply = DeliveryReply::from(&err);
    match reply.status {
        Disposition::Drop => {
            tracing::warn!(route, error = %err, kind = %err.kind(), "dropping message");
            (StatusCode::OK, Json(reply)).into_response()
        }
        _ => {
            tracing::error!(route, error = %err, kind = %err.kind(), "delivery failed, asking for redelivery");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(reply)).into_response()
        }
    }
}
