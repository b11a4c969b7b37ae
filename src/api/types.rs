// HTTP wire types (C5): request/response shapes and the structured API
// error, keeping transport concerns (status codes, JSON shape) separate
// from domain state.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize, Serializer};

use crate::api::metrics::Metrics;
use crate::error::Error as CoreError;
use crate::executor::{Executor, ExecutorError, FlowStatus, PollOutcome};
use crate::flow::{DynamicValue, FlowValue, Schema};
use crate::templates::TemplateRegistry;

/// Shared state handed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct ApiState {
    pub executor: Arc<dyn Executor>,
    pub templates: Arc<TemplateRegistry>,
    pub metrics: Arc<Metrics>,
}

/// A tagged union of the four ways a flow can be started. Field names are
/// this crate's own; only the outer tag (`"Flow"`, `"FlowWithParameter"`,
/// `"Template"`, `"TemplateWithParameter"`) is load-bearing for dispatch.
#[derive(Debug, Deserialize)]
pub enum StartRequest {
    Flow(FlowValue),
    FlowWithParameter {
        flow: FlowValue,
        input_schema: Schema,
        parameter: serde_json::Value,
    },
    Template {
        id: String,
    },
    TemplateWithParameter {
        id: String,
        parameter: serde_json::Value,
    },
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    #[serde(rename = "flowId")]
    pub flow_id: String,
}

#[derive(Debug, Serialize)]
pub struct GetAllResponse {
    pub flows: HashMap<String, FlowStatus>,
}

/// The poll response's wire shape does not follow from a derive: `Running`
/// must serialize as `{"Running":{}}`, not the bare string a unit variant
/// would otherwise produce. `Succeeded`/`Failed`/`Died` nest whatever their
/// payload type already serializes to.
#[derive(Debug)]
pub enum PollResponse {
    Running,
    Succeeded(DynamicValue),
    Failed(DynamicValue),
    Died(ExecutorError),
}

impl From<Option<PollOutcome>> for PollResponse {
    fn from(outcome: Option<PollOutcome>) -> Self {
        match outcome {
            None => PollResponse::Running,
            Some(PollOutcome::Succeeded(v)) => PollResponse::Succeeded(v),
            Some(PollOutcome::Failed(v)) => PollResponse::Failed(v),
            Some(PollOutcome::Died(e)) => PollResponse::Died(e),
        }
    }
}

impl Serialize for PollResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            PollResponse::Running => map.serialize_entry("Running", &serde_json::json!({}))?,
            PollResponse::Succeeded(v) => map.serialize_entry("Succeeded", v)?,
            PollResponse::Failed(v) => map.serialize_entry("Failed", v)?,
            PollResponse::Died(e) => map.serialize_entry("Died", e)?,
        }
        map.end()
    }
}

/// Structured API error. The `code` drives the HTTP status mapping in
/// `IntoResponse`; `message` is human-readable.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Decode(_) => ApiError::bad_request(err.to_string()),
            CoreError::NotFound(_) => ApiError::not_found(err.to_string()),
            CoreError::Io { .. } => ApiError::internal(err.to_string()),
            CoreError::Executor(e) => ApiError::internal(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
