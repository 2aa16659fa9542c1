use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;

mod data;
mod delivery;
mod erp;
mod monitoring;

pub use data::{DataState, data_router};
pub use erp::{ErpState, erp_router};
pub use monitoring::{MonitoringState, monitoring_router};

/// Serve `app` on `bind:port` until `shutdown` is cancelled.
pub async fn run(bind: &str, port: u16, app: Router, shutdown: CancellationToken) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .map_err(|e| format!("bind {bind}:{port}: {e}"))?;
    tracing::info!(addr = %format!("{bind}:{port}"), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))?;

    Ok(())
}

/// Serve `app` until Ctrl+C, then drain for at most `drain`.
pub async fn serve_until_signal(bind: &str, port: u16, app: Router, drain: Duration) -> Result<(), String> {
    let token = CancellationToken::new();
    let server_token = token.clone();
    let addr = bind.to_string();
    let mut server = tokio::spawn(async move { run(&addr, port, app, server_token).await });

    tokio::select! {
        res = &mut server => return res.map_err(|e| format!("server task: {e}"))?,
        res = tokio::signal::ctrl_c() => {
            res.map_err(|e| format!("signal: {e}"))?;
            tracing::info!("shutting down...");
            token.cancel();
        }
    }

    match tokio::time::timeout(drain, &mut server).await {
        Ok(res) => res.map_err(|e| format!("server task: {e}"))?,
        Err(_) => {
            tracing::warn!("server did not stop in time, aborting");
            server.abort();
            Ok(())
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    pub fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/cloudevents+json")
            .body(body.into())
            .unwrap()
    }
}
