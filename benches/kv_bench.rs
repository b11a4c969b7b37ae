// Criterion benchmarks for the versioned KV store's hot paths: put,
// getLatest, and scanAll over a populated namespace.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

use zflow::kv::memory::InMemoryKv;
use zflow::kv::KvStore;

const NS: &str = "_zflow_bench";

fn populated(rt: &Runtime, entries: u64) -> InMemoryKv {
    let kv = InMemoryKv::new();
    rt.block_on(async {
        for i in 0..entries {
            kv.put(NS, format!("key-{i}").as_bytes(), i, vec![0u8; 128])
                .await
                .unwrap();
        }
    });
    kv
}

fn bench_put(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let kv = InMemoryKv::new();
    let mut ts = 0u64;
    c.bench_function("kv_put", |b| {
        b.iter(|| {
            ts += 1;
            rt.block_on(kv.put(NS, b"bench-key", ts, black_box(vec![0u8; 128])))
                .unwrap();
        })
    });
}

fn bench_get_latest(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let kv = populated(&rt, 1_000);
    c.bench_function("kv_get_latest", |b| {
        b.iter(|| rt.block_on(kv.get_latest(NS, black_box(b"key-500"), None)).unwrap())
    });
}

fn bench_scan_all(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let kv = populated(&rt, 1_000);
    c.bench_function("kv_scan_all", |b| {
        b.iter(|| {
            rt.block_on(async {
                use futures::StreamExt;
                let stream = kv.scan_all(NS).await.unwrap();
                let count = stream.fold(0usize, |acc, _| async move { acc + 1 }).await;
                black_box(count)
            })
        })
    });
}

criterion_group!(benches, bench_put, bench_get_latest, bench_scan_all);
criterion_main!(benches);
