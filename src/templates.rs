// Flow-template registry (C2): named, typed flow templates persisted
// through the versioned KV store.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flow::FlowValue;
use crate::flow::Schema;
use crate::kv::{KvStore, Namespace};

const TEMPLATES_NAMESPACE: Namespace = "_zflow_workflow_templates";

/// Templates carry a single logical version: the registry is not itself
/// versioned, so every `put` is written at timestamp 0 and `getLatest`
/// with no bound always answers with the most recent write.
const TEMPLATE_TIMESTAMP: u64 = 0;

/// A named, persisted flow, optionally parameterized by a typed input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub flow: FlowValue,
    pub input_schema: Option<Schema>,
}

impl Template {
    pub fn new(flow: FlowValue) -> Self {
        Self {
            flow,
            input_schema: None,
        }
    }

    pub fn with_input(flow: FlowValue, input_schema: Schema) -> Self {
        Self {
            flow,
            input_schema: Some(input_schema),
        }
    }
}

pub struct TemplateRegistry {
    store: Arc<dyn KvStore>,
}

impl TemplateRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn put(&self, id: &str, template: &Template) -> Result<()> {
        let bytes = serde_json::to_vec(template)
            .map_err(|e| Error::decode(format!("encoding template {id}: {e}")))?;
        self.store
            .put(TEMPLATES_NAMESPACE, id.as_bytes(), TEMPLATE_TIMESTAMP, bytes)
            .await
    }

    /// Returns `None` if the id is absent. A present-but-malformed value is
    /// a decode error, not `None`.
    pub async fn get(&self, id: &str) -> Result<Option<Template>> {
        let Some(bytes) = self.store.get_latest(TEMPLATES_NAMESPACE, id.as_bytes(), None).await? else {
            return Ok(None);
        };
        let template = serde_json::from_slice(&bytes)
            .map_err(|e| Error::decode(format!("decoding template {id}: {e}")))?;
        Ok(Some(template))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(TEMPLATES_NAMESPACE, id.as_bytes(), None).await
    }

    pub async fn all(&self) -> Result<BoxStream<'static, Result<(String, Template)>>> {
        let entries = self.store.scan_all(TEMPLATES_NAMESPACE).await?;
        let mapped = entries.map(|entry| {
            let (key, value) = entry?;
            let id = String::from_utf8(key)
                .map_err(|e| Error::decode(format!("template id is not utf-8: {e}")))?;
            let template = serde_json::from_slice(&value)
                .map_err(|e| Error::decode(format!("decoding template {id}: {e}")))?;
            Ok((id, template))
        });
        Ok(Box::pin(mapped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::DynamicValue;
    use crate::kv::memory::InMemoryKv;
    use futures::StreamExt;

    fn registry() -> TemplateRegistry {
        TemplateRegistry::new(Arc::new(InMemoryKv::new()))
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let reg = registry();
        let template = Template::new(FlowValue::succeed(DynamicValue::int(11)));
        reg.put("greet", &template).await.unwrap();
        assert_eq!(reg.get("greet").await.unwrap(), Some(template));
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let reg = registry();
        assert_eq!(reg.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn all_enumerates_every_put() {
        let reg = registry();
        for id in ["a", "b", "c"] {
            reg.put(id, &Template::new(FlowValue::succeed(DynamicValue::int(1))))
                .await
                .unwrap();
        }
        let mut ids: Vec<String> = reg
            .all()
            .await
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect()
            .await;
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn delete_removes_only_that_id() {
        let reg = registry();
        reg.put("keep", &Template::new(FlowValue::succeed(DynamicValue::int(1))))
            .await
            .unwrap();
        reg.put("drop", &Template::new(FlowValue::succeed(DynamicValue::int(2))))
            .await
            .unwrap();
        reg.delete("drop").await.unwrap();
        assert_eq!(reg.get("drop").await.unwrap(), None);
        assert!(reg.get("keep").await.unwrap().is_some());
    }
}
