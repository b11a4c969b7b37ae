// In-memory reference backend for the versioned KV store (C6). Used by
// tests, benches and small deployments; validates the C1 contract
// independent of a networked backend.
//
// Keyed by DashMap rather than `Arc<RwLock<HashMap>>` for sharded locking -
// the same migration common concurrent-map wisdom for read-heavy caches.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, BoxStream};
use std::collections::BTreeMap;

use super::{KvStore, Marker, Namespace, Timestamp};
use crate::error::Result;

type Key = Vec<u8>;

/// Per-key history, newest timestamp last for cheap range iteration.
type History = BTreeMap<Timestamp, Vec<u8>>;

#[derive(Default)]
pub struct InMemoryKv {
    table: DashMap<(Namespace, Key), History>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
        }
    }
}

#[async_trait]
impl KvStore for InMemoryKv {
    async fn put(&self, ns: Namespace, key: &[u8], ts: Timestamp, value: Vec<u8>) -> Result<()> {
        self.table
            .entry((ns, key.to_vec()))
            .or_default()
            .insert(ts, value);
        Ok(())
    }

    async fn get_latest(
        &self,
        ns: Namespace,
        key: &[u8],
        before: Option<Timestamp>,
    ) -> Result<Option<Vec<u8>>> {
        let Some(history) = self.table.get(&(ns, key.to_vec())) else {
            return Ok(None);
        };
        Ok(match before {
            Some(bound) => history.range(..=bound).next_back().map(|(_, v)| v.clone()),
            None => history.values().next_back().cloned(),
        })
    }

    async fn get_latest_timestamp(
        &self,
        ns: Namespace,
        key: &[u8],
    ) -> Result<Option<Timestamp>> {
        let Some(history) = self.table.get(&(ns, key.to_vec())) else {
            return Ok(None);
        };
        Ok(history.keys().next_back().copied())
    }

    async fn get_all_timestamps(
        &self,
        ns: Namespace,
        key: &[u8],
    ) -> Result<BoxStream<'static, Result<Timestamp>>> {
        let timestamps: Vec<Timestamp> = match self.table.get(&(ns, key.to_vec())) {
            Some(history) => history.keys().rev().copied().collect(),
            None => Vec::new(),
        };
        Ok(Box::pin(stream::iter(timestamps.into_iter().map(Ok))))
    }

    async fn scan_all(
        &self,
        ns: Namespace,
    ) -> Result<BoxStream<'static, Result<(Vec<u8>, Vec<u8>)>>> {
        let entries: Vec<(Vec<u8>, Vec<u8>)> = self
            .table
            .iter()
            .filter(|e| e.key().0 == ns)
            .filter_map(|e| {
                e.value()
                    .values()
                    .next_back()
                    .map(|v| (e.key().1.clone(), v.clone()))
            })
            .collect();
        Ok(Box::pin(stream::iter(entries.into_iter().map(Ok))))
    }

    async fn scan_all_keys(&self, ns: Namespace) -> Result<BoxStream<'static, Result<Vec<u8>>>> {
        let keys: Vec<Vec<u8>> = self
            .table
            .iter()
            .filter(|e| e.key().0 == ns)
            .map(|e| e.key().1.clone())
            .collect();
        Ok(Box::pin(stream::iter(keys.into_iter().map(Ok))))
    }

    async fn delete(&self, ns: Namespace, key: &[u8], marker: Marker) -> Result<()> {
        match marker {
            None => {
                self.table.remove(&(ns, key.to_vec()));
            }
            Some(bound) => {
                if let Some(mut history) = self.table.get_mut(&(ns, key.to_vec())) {
                    // Timestamps <= bound, ascending; the last one is the
                    // retained snapshot and must survive.
                    let in_range: Vec<Timestamp> = history.range(..=bound).map(|(ts, _)| *ts).collect();
                    if let Some((_retained, rest)) = in_range.split_last() {
                        for ts in rest {
                            history.remove(ts);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
