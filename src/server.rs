//! HTTP exposition server
//!
//! Each request to the metrics endpoint runs one full collection cycle on
//! the blocking pool and renders it into a fresh registry.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tracing::{error, info, warn};

use crate::client::CommandRunner;
use crate::metrics::{render, CtdbCollector, CONTENT_TYPE};

/// Build the router serving `endpoint` and a landing page on `/`
pub fn router<R>(endpoint: &str, collector: Arc<CtdbCollector<R>>) -> Router
where
    R: CommandRunner + Send + Sync + 'static,
{
    let landing = format!(
        "<html>\n<head><title>CTDB Exporter</title></head>\n<body>\n<h1>CTDB Exporter</h1>\n<p><a href=\"{endpoint}\">Metrics</a></p>\n</body>\n</html>\n"
    );

    Router::new()
        .route(endpoint, get(metrics_handler::<R>))
        .route(
            "/",
            get(move || {
                let page = landing.clone();
                async move { Html(page) }
            }),
        )
        .with_state(collector)
}

async fn metrics_handler<R>(State(collector): State<Arc<CtdbCollector<R>>>) -> Response
where
    R: CommandRunner + Send + Sync + 'static,
{
    let outcome = match tokio::task::spawn_blocking(move || collector.collect()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Collection task failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Collection task failed: {e}"))
                .into_response();
        }
    };

    match render(&outcome) {
        Ok(body) => (StatusCode::OK, [("content-type", CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {e}"))
                .into_response()
        }
    }
}

/// Serve until Ctrl-C
pub async fn serve<R>(addr: SocketAddr, endpoint: &str, collector: Arc<CtdbCollector<R>>) -> Result<()>
where
    R: CommandRunner + Send + Sync + 'static,
{
    let app = router(endpoint, collector);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(addr = %addr, endpoint = %endpoint, "Metrics HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("metrics server error")?;

    info!("Metrics HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::runner::testing::ScriptedRunner;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_handler_success() {
        let runner = ScriptedRunner::new()
            .respond("pnn", "1")
            .respond("recmaster", "0")
            .respond("statistics -Y", "|num_clients|\n|7|");
        let response = metrics_handler(State(Arc::new(CtdbCollector::new(runner)))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], CONTENT_TYPE);
        let body = body_text(response).await;
        assert!(body.contains("ctdb_up 1"));
        assert!(body.contains(r#"ctdb_num_clients{id="1"} 7"#));
        assert!(!body.contains("ctdb_banned"));
    }

    #[tokio::test]
    async fn test_metrics_handler_failure_is_still_ok() {
        let runner = ScriptedRunner::new().fail("pnn", "ctdbd not running");
        let response = metrics_handler(State(Arc::new(CtdbCollector::new(runner)))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("ctdb_up 0"));
        assert!(!body.contains("ctdb_num_clients"));
    }

    #[test]
    fn test_router_builds_with_custom_endpoint() {
        let collector = Arc::new(CtdbCollector::new(ScriptedRunner::new()));
        let _ = router("/ctdb/metrics", collector);
    }
}
