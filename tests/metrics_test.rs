//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use pingcache::{
    CacheSpec, FaviconCache, HandlerReactor, IconDecoder, IconSource, PingCacheError,
    RequestCache, ResponseEngine, Result, StatusHook, telemetry,
};

// ============================================================================
// Mock collaborators
// ============================================================================

struct EchoEngine;

#[async_trait]
impl ResponseEngine for EchoEngine {
    type Response = String;

    async fn compute(&self, client: IpAddr) -> Result<String> {
        if client.is_unspecified() {
            return Err(PingCacheError::Engine("no template for 0.0.0.0".into()));
        }
        Ok(client.to_string())
    }
}

/// Takes long enough that concurrent lookups pile up on one load.
struct SlowEngine;

#[async_trait]
impl ResponseEngine for SlowEngine {
    type Response = String;

    async fn compute(&self, client: IpAddr) -> Result<String> {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        Ok(client.to_string())
    }
}

struct NoIcons;

#[async_trait]
impl IconDecoder for NoIcons {
    type Icon = ();

    async fn decode(&self, _source: &IconSource) -> Result<()> {
        Err(PingCacheError::Decode("not found".into()))
    }
}

struct NamedHook(&'static str);

impl StatusHook for NamedHook {
    fn name(&self) -> &str {
        self.0
    }

    fn register(&self) -> Result<()> {
        Ok(())
    }

    fn unregister(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    counter_with_label(snapshot, name, None)
}

/// Sum counter values matching a name and, optionally, one label value.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .filter(|(key, _, _, _)| match label {
            Some((k, v)) => key
                .key()
                .labels()
                .any(|l| l.key() == k && l.value() == v),
            None => true,
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn localhost() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn record_stats_emits_hits_and_misses() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = RequestCache::new(Arc::new(EchoEngine), "maximumSize=10, recordStats");
                cache.lookup(localhost()).await.unwrap();
                cache.lookup(localhost()).await.unwrap();
                cache.lookup(localhost()).await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 2);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_HITS_TOTAL, Some(("cache", "request"))),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn waiting_on_a_shared_load_counts_as_miss() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = RequestCache::new(Arc::new(SlowEngine), "maximumSize=10, recordStats");
                let lookups = (0..4).map(|_| cache.lookup(localhost()));
                for result in futures_util::future::join_all(lookups).await {
                    result.unwrap();
                }
                cache.lookup(localhost()).await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 4);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn without_record_stats_no_hit_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = RequestCache::new(Arc::new(EchoEngine), "maximumSize=10");
                cache.lookup(localhost()).await.unwrap();
                cache.lookup(localhost()).await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 0);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_load_records_failure() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = RequestCache::new(Arc::new(EchoEngine), "maximumSize=10");
                let unspecified = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
                assert!(cache.lookup(unspecified).await.is_err());
                assert!(cache.lookup(unspecified).await.is_err());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_total(&snapshot, telemetry::CACHE_LOAD_FAILURES_TOTAL),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_decode_is_not_a_load_failure() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = FaviconCache::new(Arc::new(NoIcons));
                let spec = CacheSpec::parse("maximumSize=5, recordStats").unwrap();
                cache.reconfigure(Some(&spec)).await;
                cache.lookup(&IconSource::file("missing.png")).await;
                cache.lookup(&IconSource::file("missing.png")).await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_total(&snapshot, telemetry::CACHE_LOAD_FAILURES_TOTAL),
        0
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_HITS_TOTAL, Some(("cache", "favicon"))),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn reconfigure_records_rebuild_outcome() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = RequestCache::new(Arc::new(EchoEngine), "maximumSize=10");
                cache.reconfigure("maximumSize=10").await;
                cache.reconfigure("maximumSize=20").await;
                cache.reconfigure("maximumSize=oops").await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_REBUILDS_TOTAL), 2);
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::CACHE_REBUILDS_TOTAL,
            Some(("outcome", "fallback"))
        ),
        1
    );
}

#[test]
fn handler_transitions_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let mut reactor = HandlerReactor::new(
            Arc::new(NamedHook("ping-event")),
            Some(Arc::new(NamedHook("protocol"))),
        );
        reactor.apply(true);
        reactor.apply(true);
        reactor.apply(false);
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::HANDLER_TRANSITIONS_TOTAL,
            Some(("direction", "register"))
        ),
        2
    );
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::HANDLER_TRANSITIONS_TOTAL,
            Some(("hook", "protocol"))
        ),
        2
    );
}
