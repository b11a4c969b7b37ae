// Versioned key-value store (C1): a durable mapping from (namespace, key)
// to an ordered sequence of (timestamp, value) pairs, with range scans and
// marker-based truncation.

pub mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// Logical partition inside the store. Distinct namespaces never share keys.
pub type Namespace = &'static str;

/// Caller-supplied monotonic logical counter. Ordering is numeric, not wall
/// clock - the store never reads system time on its own.
pub type Timestamp = u64;

/// A marker bounds how much history `delete` truncates while retaining the
/// newest snapshot at or before it. `None` removes every version.
pub type Marker = Option<Timestamp>;

/// Durable, timestamped, namespaced byte store. Implementors back the
/// template registry (C2) and the executor's durable promises (C3).
///
/// Object-safe so callers can hold `Arc<dyn KvStore>` without committing to
/// a concrete backend.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Inserts `(ns, key, ts, value)`, overwriting any prior write at the
    /// same `(ns, key, ts)`. Writing an identical value at an existing
    /// timestamp is a no-op in effect (idempotent).
    async fn put(&self, ns: Namespace, key: &[u8], ts: Timestamp, value: Vec<u8>) -> Result<()>;

    /// Returns the value of the largest-timestamp version with
    /// `ts <= before` (or the largest version overall if `before` is
    /// absent). `None` if no such version exists.
    async fn get_latest(
        &self,
        ns: Namespace,
        key: &[u8],
        before: Option<Timestamp>,
    ) -> Result<Option<Vec<u8>>>;

    /// As `get_latest` but returns the timestamp rather than the value.
    async fn get_latest_timestamp(
        &self,
        ns: Namespace,
        key: &[u8],
    ) -> Result<Option<Timestamp>>;

    /// Every timestamp stored for `(ns, key)`, descending.
    async fn get_all_timestamps(
        &self,
        ns: Namespace,
        key: &[u8],
    ) -> Result<BoxStream<'static, Result<Timestamp>>>;

    /// One `(key, value)` entry per key in `ns`, newest version per key.
    /// Streamed so a networked backend can page results; the in-memory
    /// reference backend snapshots the matching entries up front since it
    /// has no network round trip to amortize.
    async fn scan_all(&self, ns: Namespace) -> Result<BoxStream<'static, Result<(Vec<u8>, Vec<u8>)>>>;

    /// As `scan_all` but omits values.
    async fn scan_all_keys(&self, ns: Namespace) -> Result<BoxStream<'static, Result<Vec<u8>>>>;

    /// With `marker = Some(t)`: removes every version with `ts <= t` except
    /// the most recent such version. With `marker = None`: removes every
    /// version.
    async fn delete(&self, ns: Namespace, key: &[u8], marker: Marker) -> Result<()>;
}

#[cfg(test)]
mod contract_tests {
    use super::memory::InMemoryKv;
    use super::*;
    use futures::StreamExt;

    const NS: Namespace = "_zflow_contract_tests";

    #[tokio::test]
    async fn put_then_get_latest_round_trips() {
        let kv = InMemoryKv::new();
        kv.put(NS, b"k", 5, b"v5".to_vec()).await.unwrap();
        assert_eq!(
            kv.get_latest(NS, b"k", None).await.unwrap(),
            Some(b"v5".to_vec())
        );
        assert_eq!(
            kv.get_latest(NS, b"k", Some(5)).await.unwrap(),
            Some(b"v5".to_vec())
        );
        assert_eq!(kv.get_latest(NS, b"k", Some(4)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_latest_before_only_later_versions_is_none() {
        let kv = InMemoryKv::new();
        kv.put(NS, b"k", 10, b"v10".to_vec()).await.unwrap();
        kv.put(NS, b"k", 20, b"v20".to_vec()).await.unwrap();
        assert_eq!(kv.get_latest(NS, b"k", Some(5)).await.unwrap(), None);
        assert_eq!(
            kv.get_latest(NS, b"k", Some(15)).await.unwrap(),
            Some(b"v10".to_vec())
        );
    }

    #[tokio::test]
    async fn put_overwrites_same_timestamp_deterministically() {
        let kv = InMemoryKv::new();
        kv.put(NS, b"k", 1, b"first".to_vec()).await.unwrap();
        kv.put(NS, b"k", 1, b"second".to_vec()).await.unwrap();
        assert_eq!(
            kv.get_latest(NS, b"k", None).await.unwrap(),
            Some(b"second".to_vec())
        );
    }

    #[tokio::test]
    async fn get_all_timestamps_is_descending() {
        let kv = InMemoryKv::new();
        for ts in [3u64, 1, 2] {
            kv.put(NS, b"k", ts, vec![]).await.unwrap();
        }
        let stream = kv.get_all_timestamps(NS, b"k").await.unwrap();
        let ts: Vec<Timestamp> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(ts, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn delete_with_marker_retains_newest_snapshot_at_or_before() {
        let kv = InMemoryKv::new();
        for ts in [1u64, 2, 3, 10] {
            kv.put(NS, b"k", ts, vec![ts as u8]).await.unwrap();
        }
        kv.delete(NS, b"k", Some(5)).await.unwrap();

        let stream = kv.get_all_timestamps(NS, b"k").await.unwrap();
        let ts: Vec<Timestamp> = stream.map(|r| r.unwrap()).collect().await;
        // 3 is retained (newest <= 5); 1 and 2 are gone; 10 survives (> marker).
        assert_eq!(ts, vec![10, 3]);
    }

    #[tokio::test]
    async fn delete_without_marker_removes_everything() {
        let kv = InMemoryKv::new();
        kv.put(NS, b"k", 1, vec![]).await.unwrap();
        kv.put(NS, b"k", 2, vec![]).await.unwrap();
        kv.delete(NS, b"k", None).await.unwrap();
        assert_eq!(kv.get_latest(NS, b"k", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn scan_all_enumerates_surviving_keys_newest_version() {
        let kv = InMemoryKv::new();
        kv.put(NS, b"a", 1, b"a1".to_vec()).await.unwrap();
        kv.put(NS, b"a", 2, b"a2".to_vec()).await.unwrap();
        kv.put(NS, b"b", 1, b"b1".to_vec()).await.unwrap();

        let stream = kv.scan_all(NS).await.unwrap();
        let mut entries: Vec<(Vec<u8>, Vec<u8>)> =
            stream.map(|r| r.unwrap()).collect().await;
        entries.sort();
        assert_eq!(
            entries,
            vec![(b"a".to_vec(), b"a2".to_vec()), (b"b".to_vec(), b"b1".to_vec())]
        );
    }
}
