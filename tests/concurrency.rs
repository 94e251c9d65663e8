//! Concurrency tests: shared dispatch tables under parallel delivery and
//! subscription churn.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use eventwire::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;

eventwire::event_group! {
    pub enum Tick {
        Frame { seq: u64, payload: Vec<u8> },
        Marker { label: String },
    }
}

fn shared_table() -> Arc<DispatchTable> {
    let mut builder = DispatchTableBuilder::new();
    builder.register::<Tick>(1).unwrap();
    Arc::new(builder.build())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_dispatch_counts_every_message() {
    let table = shared_table();
    let total = Arc::new(AtomicU64::new(0));

    let t = Arc::clone(&total);
    table
        .subscribe::<Frame, _>(move |frame| {
            t.fetch_add(frame.seq, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();

    let workers = 8u64;
    let per_worker = 2_000u64;
    let mut tasks = JoinSet::new();
    for worker in 0..workers {
        let table = Arc::clone(&table);
        tasks.spawn(async move {
            for i in 0..per_worker {
                let frame = Tick::from(Frame {
                    seq: 1,
                    payload: vec![(worker + i) as u8; (i % 64) as usize],
                });
                let (id, bytes) = table.to_vec(&frame).unwrap();
                table.dispatch_incoming(id, &bytes).unwrap();
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    assert_eq!(total.load(Ordering::Relaxed), workers * per_worker);
    let snapshot = table.metrics().snapshot();
    assert_eq!(snapshot.messages_received, workers * per_worker);
    assert_eq!(snapshot.deliveries, workers * per_worker);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscribe_unsubscribe_races_delivery() {
    let table = shared_table();
    let stable = Arc::new(AtomicU64::new(0));

    let s = Arc::clone(&stable);
    table
        .subscribe::<Marker, _>(move |_| {
            s.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();

    let churn = {
        let table = Arc::clone(&table);
        tokio::spawn(async move {
            for _ in 0..1_000 {
                let id = table.subscribe::<Marker, _>(|_| Ok(())).unwrap();
                assert!(table.unsubscribe(&id).unwrap());
            }
        })
    };

    let publishers: Vec<_> = (0..4)
        .map(|n| {
            let table = Arc::clone(&table);
            tokio::spawn(async move {
                for i in 0..500 {
                    let report = table
                        .publish_variant(Marker {
                            label: format!("{n}-{i}"),
                        })
                        .unwrap();
                    assert_eq!(report.failed, 0);
                    assert!(report.delivered >= 1);
                }
            })
        })
        .collect();

    churn.await.unwrap();
    for publisher in publishers {
        publisher.await.unwrap();
    }

    assert_eq!(stable.load(Ordering::Relaxed), 2_000);
    assert_eq!(table.metrics().snapshot().messages_published, 2_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_codecs_in_parallel() {
    let codec = GroupCodec::<Tick>::new().unwrap();
    let mut tasks = JoinSet::new();
    for n in 0..16u64 {
        let codec = codec.clone();
        tasks.spawn(async move {
            let mut buffer = [0u8; 128];
            for i in 0..1_000u64 {
                let value = Tick::from(Marker {
                    label: format!("{n}:{i}"),
                });
                let written = codec.serialize_into(&value, &mut buffer).unwrap();
                assert_eq!(codec.from_bytes(&buffer[..written]).unwrap(), value);
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
}
