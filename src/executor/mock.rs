// Test double for the executor contract. Lets HTTP façade tests arrange
// exactly when and how a flow finishes without a real interpreter. The
// "reveal after N polls" affordance is a test-only mechanism, not part of
// the real executor contract.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use parking_lot::Mutex;

use crate::flow::FlowValue;

use super::{Executor, ExecutorError, ExecutorResult, FlowId, FlowStatus, PollOutcome, PromiseId};

struct Scripted {
    reveal_after_polls: u32,
    outcome: PollOutcome,
}

#[derive(Default)]
pub struct MockExecutor {
    started: Mutex<HashMap<FlowId, FlowValue>>,
    poll_counts: Mutex<HashMap<FlowId, u32>>,
    scripted: Mutex<HashMap<FlowId, Scripted>>,
    finished: Mutex<HashSet<FlowId>>,
    deleted: Mutex<HashSet<FlowId>>,
    paused: Mutex<HashSet<FlowId>>,
    resumed: Mutex<HashSet<FlowId>>,
    aborted: Mutex<HashSet<FlowId>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: the flow finishes with `outcome` starting from the
    /// `reveal_after_polls`-th call to `poll` (1-indexed). Earlier polls
    /// return `None`.
    pub fn script_outcome(&self, id: FlowId, reveal_after_polls: u32, outcome: PollOutcome) {
        self.scripted.lock().insert(
            id,
            Scripted {
                reveal_after_polls,
                outcome,
            },
        );
    }

    /// Snapshot of every flow id that was handed to `start`, with the flow
    /// value it was started with.
    pub fn started_snapshot(&self) -> HashMap<FlowId, FlowValue> {
        self.started.lock().clone()
    }

    pub fn was_paused(&self, id: &FlowId) -> bool {
        self.paused.lock().contains(id)
    }

    pub fn was_resumed(&self, id: &FlowId) -> bool {
        self.resumed.lock().contains(id)
    }

    pub fn was_aborted(&self, id: &FlowId) -> bool {
        self.aborted.lock().contains(id)
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn start(&self, id: FlowId, flow: FlowValue) -> ExecutorResult<PromiseId> {
        let promise_id = PromiseId::from(&id);
        self.started.lock().insert(id.clone(), flow);
        self.poll_counts.lock().insert(id, 0);
        Ok(promise_id)
    }

    async fn poll(&self, id: &FlowId) -> ExecutorResult<Option<PollOutcome>> {
        if !self.started.lock().contains_key(id) {
            return Ok(None);
        }

        let mut counts = self.poll_counts.lock();
        let count = counts.entry(id.clone()).or_insert(0);
        *count += 1;
        let current = *count;
        drop(counts);

        let scripted = self.scripted.lock();
        let Some(script) = scripted.get(id) else {
            return Ok(None);
        };
        if current < script.reveal_after_polls {
            return Ok(None);
        }
        let outcome = script.outcome.clone();
        drop(scripted);
        self.finished.lock().insert(id.clone());
        Ok(Some(outcome))
    }

    async fn pause(&self, id: &FlowId) -> ExecutorResult<()> {
        self.paused.lock().insert(id.clone());
        Ok(())
    }

    async fn resume(&self, id: &FlowId) -> ExecutorResult<()> {
        self.resumed.lock().insert(id.clone());
        Ok(())
    }

    async fn abort(&self, id: &FlowId) -> ExecutorResult<()> {
        self.aborted.lock().insert(id.clone());
        Ok(())
    }

    async fn delete(&self, id: &FlowId) -> ExecutorResult<()> {
        let known = self.started.lock().contains_key(id);
        if !known {
            return Ok(());
        }
        if !self.finished.lock().contains(id) {
            return Err(ExecutorError::invalid_operation("flow is running"));
        }
        self.started.lock().remove(id);
        self.deleted.lock().insert(id.clone());
        Ok(())
    }

    async fn get_all(&self) -> ExecutorResult<BoxStream<'static, ExecutorResult<(FlowId, FlowStatus)>>> {
        let finished = self.finished.lock();
        let entries: Vec<ExecutorResult<(FlowId, FlowStatus)>> = self
            .started
            .lock()
            .keys()
            .map(|id| {
                let status = if finished.contains(id) {
                    FlowStatus::Done
                } else {
                    FlowStatus::Running
                };
                Ok((id.clone(), status))
            })
            .collect();
        Ok(Box::pin(stream::iter(entries)))
    }

    async fn restart_all(&self) -> ExecutorResult<()> {
        Ok(())
    }

    async fn force_garbage_collection(&self) -> ExecutorResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::DynamicValue;

    #[tokio::test]
    async fn poll_before_scripted_reveal_is_running() {
        let exec = MockExecutor::new();
        let id = FlowId("f".into());
        exec.start(id.clone(), FlowValue::succeed(DynamicValue::int(11)))
            .await
            .unwrap();
        exec.script_outcome(id.clone(), 2, PollOutcome::Succeeded(DynamicValue::string("hello")));

        assert_eq!(exec.poll(&id).await.unwrap(), None);
        assert_eq!(
            exec.poll(&id).await.unwrap(),
            Some(PollOutcome::Succeeded(DynamicValue::string("hello")))
        );
    }

    #[tokio::test]
    async fn delete_running_flow_fails() {
        let exec = MockExecutor::new();
        let id = FlowId("f".into());
        exec.start(id.clone(), FlowValue::succeed(DynamicValue::int(1)))
            .await
            .unwrap();
        let err = exec.delete(&id).await.unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidOperationArguments { .. }));
    }

    #[tokio::test]
    async fn delete_unknown_flow_succeeds() {
        let exec = MockExecutor::new();
        exec.delete(&FlowId("nope".into())).await.unwrap();
    }

    #[tokio::test]
    async fn control_ops_record_exactly_once() {
        let exec = MockExecutor::new();
        let id = FlowId("f".into());
        exec.start(id.clone(), FlowValue::succeed(DynamicValue::int(1)))
            .await
            .unwrap();
        exec.pause(&id).await.unwrap();
        exec.pause(&id).await.unwrap();
        exec.resume(&id).await.unwrap();
        exec.abort(&id).await.unwrap();
        assert!(exec.was_paused(&id));
        assert!(exec.was_resumed(&id));
        assert!(exec.was_aborted(&id));
    }
}
