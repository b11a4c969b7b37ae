// Executor-facing lifecycle contract (C3): the interface the HTTP façade
// drives to start, poll, and control running flows. The core specifies the
// contract only; the interpreter that evaluates a flow step-by-step is an
// external collaborator. Two implementors ship here: a
// test double (`MockExecutor`) and a minimal real backend
// (`InMemoryExecutor`) for the small flow algebra in `crate::flow`.

pub mod memory;
pub mod mock;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::flow::{DynamicValue, FlowValue};

/// Opaque, server-generated identifier for a running flow instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowId(pub String);

impl FlowId {
    pub fn from_string(id: String) -> Self {
        FlowId(id)
    }
}

impl FlowId {
    pub fn new_random() -> Self {
        FlowId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the durable promise that will eventually carry a flow's
/// terminal result. Derived one-to-one from the owning `FlowId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromiseId(pub String);

impl From<&FlowId> for PromiseId {
    fn from(flow_id: &FlowId) -> Self {
        PromiseId(format!("promise-{}", flow_id.0))
    }
}

/// Status of a running flow instance. Only `Running` and `Done` are
/// produced by the reference executors in this crate; `Paused` and
/// `Suspended` round-trip through the API for richer future executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    Running,
    Done,
    Paused,
    Suspended,
}

/// Internal executor failure, as opposed to a user-level flow failure. The
/// tag strings here are stable: they are exactly what the HTTP façade's
/// `Died` encoding emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ExecutorError {
    #[error("missing variable {name} in {context}")]
    MissingVariable { name: String, context: String },

    #[error("invalid operation arguments: {msg}")]
    InvalidOperationArguments { msg: String },
}

impl ExecutorError {
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        ExecutorError::InvalidOperationArguments { msg: msg.into() }
    }
}

/// The result of polling a finished flow.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Succeeded(DynamicValue),
    Failed(DynamicValue),
    Died(ExecutorError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Lifecycle contract for running flows. Object-safe so the HTTP façade can
/// hold `Arc<dyn Executor>` independent of the concrete backend.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Registers a new flow instance under `id` and schedules it. Returning
    /// does not imply completion, only that the flow has been durably
    /// recorded. `flow` is already fully resolved - any input parameter has
    /// already been bound via `FlowValue::provide`.
    async fn start(&self, id: FlowId, flow: FlowValue) -> ExecutorResult<PromiseId>;

    /// `None` while running. `Some` once the flow has reached a terminal
    /// state.
    async fn poll(&self, id: &FlowId) -> ExecutorResult<Option<PollOutcome>>;

    async fn pause(&self, id: &FlowId) -> ExecutorResult<()>;
    async fn resume(&self, id: &FlowId) -> ExecutorResult<()>;
    async fn abort(&self, id: &FlowId) -> ExecutorResult<()>;

    /// Fails with `InvalidOperationArguments` if the flow is currently
    /// live. Succeeds if the flow is unknown or finished.
    async fn delete(&self, id: &FlowId) -> ExecutorResult<()>;

    /// Every known flow with its current status.
    async fn get_all(&self) -> ExecutorResult<BoxStream<'static, ExecutorResult<(FlowId, FlowStatus)>>>;

    /// Re-schedules every persisted, non-terminal flow. Called once at
    /// process startup; a no-op for pure in-memory backends.
    async fn restart_all(&self) -> ExecutorResult<()>;

    /// Best-effort reclamation of finished-flow state.
    async fn force_garbage_collection(&self) -> ExecutorResult<()>;
}
