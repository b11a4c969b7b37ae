// Request-logging middleware (C7): structured `tracing` spans in, metrics
// counter out. No rate limiting or auth layer - those are out of scope.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use super::types::ApiState;

pub async fn request_logger_middleware(
    State(state): State<Arc<ApiState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let request_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    tracing::info!(request_id = %request_id, method = %method, uri = %uri, "incoming request");

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let is_success = response.status().is_success();
    state.metrics.record(is_success);

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        duration_ms = elapsed.as_millis() as u64,
        "request completed"
    );

    response
}
