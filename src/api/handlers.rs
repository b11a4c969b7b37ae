// HTTP handlers (C5): body decoding, dispatch into C2/C3, response shaping.
// Each handler is a thin translation layer; no business logic lives here
// beyond the Start algorithm's resolve-to-flow-value step.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use futures::StreamExt;

use crate::executor::{ExecutorError, FlowId};
use crate::flow::FlowValue;

use super::types::{ApiError, ApiResult, ApiState, GetAllResponse, PollResponse, StartRequest, StartResponse};

/// Resolves a `StartRequest` into the concrete flow value the executor will
/// run, per the Start algorithm: look up templates, decode and bind
/// parameters, and reject schema/parameter mismatches with 400.
async fn resolve_flow(state: &ApiState, request: StartRequest) -> ApiResult<FlowValue> {
    match request {
        StartRequest::Flow(flow) => Ok(flow),

        StartRequest::FlowWithParameter {
            flow,
            input_schema,
            parameter,
        } => {
            let value = input_schema.decode(&parameter)?;
            Ok(flow.provide(value))
        }

        StartRequest::Template { id } => {
            let template = state
                .templates
                .get(&id)
                .await?
                .ok_or_else(|| ApiError::not_found(format!("template {id} not found")))?;
            if template.input_schema.is_some() {
                return Err(ApiError::bad_request(format!(
                    "template {id} requires a parameter"
                )));
            }
            Ok(template.flow)
        }

        StartRequest::TemplateWithParameter { id, parameter } => {
            let template = state
                .templates
                .get(&id)
                .await?
                .ok_or_else(|| ApiError::not_found(format!("template {id} not found")))?;
            let Some(schema) = template.input_schema else {
                return Err(ApiError::bad_request(format!(
                    "template {id} does not accept a parameter"
                )));
            };
            let value = schema.decode(&parameter)?;
            Ok(template.flow.provide(value))
        }
    }
}

pub async fn start_flow(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<StartRequest>,
) -> ApiResult<Json<StartResponse>> {
    let flow = resolve_flow(&state, request).await?;
    let id = FlowId::new_random();
    state
        .executor
        .start(id.clone(), flow)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(StartResponse {
        flow_id: id.as_str().to_string(),
    }))
}

pub async fn poll_flow(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PollResponse>> {
    let outcome = state
        .executor
        .poll(&FlowId::from_string(id))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(PollResponse::from(outcome)))
}

pub async fn list_flows(State(state): State<Arc<ApiState>>) -> ApiResult<Json<GetAllResponse>> {
    let stream = state
        .executor
        .get_all()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let entries: Vec<_> = stream.collect().await;
    let mut flows = HashMap::new();
    for entry in entries {
        let (id, status) = entry.map_err(|e| ApiError::internal(e.to_string()))?;
        flows.insert(id.as_str().to_string(), status);
    }
    Ok(Json(GetAllResponse { flows }))
}

/// Running-flow delete is the one case where `InvalidOperationArguments`
/// means a user error rather than an internal fault, so it is matched
/// explicitly here instead of through a blanket `ExecutorError` conversion.
pub async fn delete_flow(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.executor.delete(&FlowId::from_string(id)).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(ExecutorError::InvalidOperationArguments { msg }) => Err(ApiError::bad_request(msg)),
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

pub async fn pause_flow(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .executor
        .pause(&FlowId::from_string(id))
        .await
        .map(|_| StatusCode::OK)
        .map_err(|e| ApiError::internal(e.to_string()))
}

pub async fn resume_flow(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .executor
        .resume(&FlowId::from_string(id))
        .await
        .map(|_| StatusCode::OK)
        .map_err(|e| ApiError::internal(e.to_string()))
}

pub async fn abort_flow(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .executor
        .abort(&FlowId::from_string(id))
        .await
        .map(|_| StatusCode::OK)
        .map_err(|e| ApiError::internal(e.to_string()))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<Arc<ApiState>>) -> String {
    state.metrics.render_prometheus()
}
