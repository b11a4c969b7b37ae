// HTTP server assembly (C5/C7): router construction and middleware
// layering. No GraphQL, auth, rate-limiting or Swagger surface - this
// service doesn't need any of it.

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::executor::Executor;
use crate::templates::TemplateRegistry;

use super::handlers::{
    abort_flow, delete_flow, health, list_flows, metrics, pause_flow, poll_flow, resume_flow, start_flow,
};
use super::metrics::Metrics;
use super::middleware::request_logger_middleware;
use super::types::ApiState;

pub struct ApiServer {
    state: Arc<ApiState>,
    request_timeout_secs: u64,
    max_body_bytes: usize,
}

impl ApiServer {
    pub fn new(executor: Arc<dyn Executor>, templates: Arc<TemplateRegistry>, config: &Config) -> Self {
        let state = Arc::new(ApiState {
            executor,
            templates,
            metrics: Arc::new(Metrics::new()),
        });
        Self {
            state,
            request_timeout_secs: config.request_timeout_secs,
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/flows", post(start_flow).get(list_flows))
            .route("/flows/{id}", get(poll_flow).delete(delete_flow))
            .route("/flows/{id}/pause", post(pause_flow))
            .route("/flows/{id}/resume", post(resume_flow))
            .route("/flows/{id}/abort", post(abort_flow))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(self.request_timeout_secs)))
            .layer(RequestBodyLimitLayer::new(self.max_body_bytes))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                request_logger_middleware,
            ))
            .layer(
                CorsLayer::new()
                    .allow_methods(Any)
                    .allow_headers(Any)
                    .allow_origin(Any),
            )
    }

    pub async fn run(&self, addr: &str) -> crate::error::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| crate::error::Error::io(format!("binding {addr}"), e))?;

        tracing::info!(%addr, "zflow HTTP server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::error::Error::io("serving HTTP", e))?;

        tracing::info!("zflow HTTP server shut down");
        Ok(())
    }
}

/// Resolves on SIGINT (ctrl-c) or, on Unix, SIGTERM - whichever arrives
/// first - so a container orchestrator's stop signal drains in-flight
/// requests instead of cutting connections mid-response.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::mock::MockExecutor;
    use crate::kv::memory::InMemoryKv;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> ApiServer {
        ApiServer::new(
            Arc::new(MockExecutor::new()),
            Arc::new(TemplateRegistry::new(Arc::new(InMemoryKv::new()))),
            &Config::default(),
        )
    }

    #[tokio::test]
    async fn health_endpoint_is_ok() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_is_ok() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_unknown_flow_is_ok() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/flows/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
