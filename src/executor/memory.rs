// Minimal real executor backend. The flow algebra in `crate::flow` has no
// suspension points of its own, so every flow resolves the instant it is
// started; the outcome is still written through a durable promise row so
// restarts and deletes observe the same contract a backend with real
// suspension would need to honor.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};

use crate::flow::{DynamicValue, FlowValue};
use crate::kv::{KvStore, Namespace};

use super::{Executor, ExecutorError, ExecutorResult, FlowId, FlowStatus, PollOutcome, PromiseId};

const PROMISES_NAMESPACE: Namespace = "_zflow_promises";
const PROMISE_TIMESTAMP: u64 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum StoredOutcome {
    Succeeded(DynamicValue),
    Failed(DynamicValue),
    Died(ExecutorError),
}

impl From<StoredOutcome> for PollOutcome {
    fn from(o: StoredOutcome) -> Self {
        match o {
            StoredOutcome::Succeeded(v) => PollOutcome::Succeeded(v),
            StoredOutcome::Failed(v) => PollOutcome::Failed(v),
            StoredOutcome::Died(e) => PollOutcome::Died(e),
        }
    }
}

/// Evaluates the four-constructor flow algebra to completion. Not a general
/// interpreter - the leaf constructors are input-independent, so `Provide`
/// just recurses into its wrapped flow. Sufficient to exercise `provide`'s
/// structural equality end to end through start/poll.
fn run(flow: &FlowValue) -> StoredOutcome {
    match flow {
        FlowValue::Succeed(v) => StoredOutcome::Succeeded(v.clone()),
        FlowValue::Fail(v) => StoredOutcome::Failed(v.clone()),
        FlowValue::Die(e) => StoredOutcome::Died(e.clone()),
        FlowValue::Provide { flow, .. } => run(flow),
    }
}

pub struct InMemoryExecutor {
    store: Arc<dyn KvStore>,
}

impl InMemoryExecutor {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn promise_key(id: &FlowId) -> Vec<u8> {
        let promise_id = PromiseId::from(id);
        promise_id.0.into_bytes()
    }
}

#[async_trait]
impl Executor for InMemoryExecutor {
    async fn start(&self, id: FlowId, flow: FlowValue) -> ExecutorResult<PromiseId> {
        let outcome = run(&flow);
        let bytes = serde_json::to_vec(&outcome).map_err(|e| {
            ExecutorError::invalid_operation(format!("encoding flow outcome: {e}"))
        })?;
        let promise_id = PromiseId::from(&id);
        self.store
            .put(PROMISES_NAMESPACE, &Self::promise_key(&id), PROMISE_TIMESTAMP, bytes)
            .await
            .map_err(|e| ExecutorError::invalid_operation(e.to_string()))?;
        Ok(promise_id)
    }

    async fn poll(&self, id: &FlowId) -> ExecutorResult<Option<PollOutcome>> {
        let stored = self
            .store
            .get_latest(PROMISES_NAMESPACE, &Self::promise_key(id), None)
            .await
            .map_err(|e| ExecutorError::invalid_operation(e.to_string()))?;
        let Some(bytes) = stored else {
            return Ok(None);
        };
        let outcome: StoredOutcome = serde_json::from_slice(&bytes).map_err(|e| {
            ExecutorError::invalid_operation(format!("decoding flow outcome: {e}"))
        })?;
        Ok(Some(outcome.into()))
    }

    async fn pause(&self, _id: &FlowId) -> ExecutorResult<()> {
        // Flows resolve the instant they start; pausing an already-finished
        // flow is a documented no-op.
        Ok(())
    }

    async fn resume(&self, _id: &FlowId) -> ExecutorResult<()> {
        Ok(())
    }

    async fn abort(&self, _id: &FlowId) -> ExecutorResult<()> {
        Ok(())
    }

    async fn delete(&self, id: &FlowId) -> ExecutorResult<()> {
        self.store
            .delete(PROMISES_NAMESPACE, &Self::promise_key(id), None)
            .await
            .map_err(|e| ExecutorError::invalid_operation(e.to_string()))
    }

    async fn get_all(&self) -> ExecutorResult<BoxStream<'static, ExecutorResult<(FlowId, FlowStatus)>>> {
        let keys = self
            .store
            .scan_all_keys(PROMISES_NAMESPACE)
            .await
            .map_err(|e| ExecutorError::invalid_operation(e.to_string()))?;
        use futures::StreamExt;
        let entries: Vec<ExecutorResult<(FlowId, FlowStatus)>> = keys
            .map(|key| {
                let key = key.map_err(|e| ExecutorError::invalid_operation(e.to_string()))?;
                let promise_id = String::from_utf8(key)
                    .map_err(|e| ExecutorError::invalid_operation(e.to_string()))?;
                let flow_id = promise_id
                    .strip_prefix("promise-")
                    .unwrap_or(&promise_id)
                    .to_string();
                Ok((FlowId(flow_id), FlowStatus::Done))
            })
            .collect()
            .await;
        Ok(Box::pin(stream::iter(entries)))
    }

    async fn restart_all(&self) -> ExecutorResult<()> {
        // Every flow here already resolved synchronously at start time;
        // there is nothing left to reschedule.
        Ok(())
    }

    async fn force_garbage_collection(&self) -> ExecutorResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::memory::InMemoryKv;

    fn executor() -> InMemoryExecutor {
        InMemoryExecutor::new(Arc::new(InMemoryKv::new()))
    }

    #[tokio::test]
    async fn start_then_poll_returns_succeeded() {
        let exec = executor();
        let id = FlowId::new_random();
        exec.start(id.clone(), FlowValue::succeed(DynamicValue::int(11)))
            .await
            .unwrap();
        assert_eq!(
            exec.poll(&id).await.unwrap(),
            Some(PollOutcome::Succeeded(DynamicValue::int(11)))
        );
    }

    #[tokio::test]
    async fn provide_runs_the_wrapped_flow() {
        let exec = executor();
        let id = FlowId::new_random();
        let flow = FlowValue::succeed(DynamicValue::int(1)).provide(DynamicValue::int(11));
        exec.start(id.clone(), flow).await.unwrap();
        assert_eq!(
            exec.poll(&id).await.unwrap(),
            Some(PollOutcome::Succeeded(DynamicValue::int(1)))
        );
    }

    #[tokio::test]
    async fn poll_unknown_flow_is_none() {
        let exec = executor();
        assert_eq!(exec.poll(&FlowId::new_random()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn died_outcome_round_trips() {
        let exec = executor();
        let id = FlowId::new_random();
        exec.start(
            id.clone(),
            FlowValue::die(ExecutorError::MissingVariable {
                name: "x".into(),
                context: "y".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            exec.poll(&id).await.unwrap(),
            Some(PollOutcome::Died(ExecutorError::MissingVariable {
                name: "x".into(),
                context: "y".into(),
            }))
        );
    }

    #[tokio::test]
    async fn delete_then_poll_is_none() {
        let exec = executor();
        let id = FlowId::new_random();
        exec.start(id.clone(), FlowValue::succeed(DynamicValue::int(1)))
            .await
            .unwrap();
        exec.delete(&id).await.unwrap();
        assert_eq!(exec.poll(&id).await.unwrap(), None);
    }
}
