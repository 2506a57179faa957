//! Status response cache, keyed on client address.
//!
//! [`RequestCache`] owns exactly one live [`LoadingCache`] at all times. A
//! configuration reload with a different policy string builds a fresh
//! instance, swaps it in atomically, then discards the old one. Lookups that
//! already picked up the old instance finish against it.
//!
//! An invalid policy string never leaves the cache unusable: the manager logs
//! the error and builds from [`DEFAULT_REQUEST_SPEC`] instead.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::loading::{Loader, LoadingCache};
use crate::Result;
use crate::spec::{CacheSpec, CacheSpecError};
use crate::telemetry;

/// Policy used when the configured request cache spec is invalid.
pub const DEFAULT_REQUEST_SPEC: &str = "expireAfterAccess=6h, maximumSize=1000";

const CACHE_NAME: &str = "request";

/// Parsed form of [`DEFAULT_REQUEST_SPEC`].
pub fn default_request_spec() -> CacheSpec {
    CacheSpec {
        maximum_size: Some(1000),
        expire_after_access: Some(Duration::from_secs(6 * 3600)),
        ..CacheSpec::default()
    }
}

/// Computes the status response for one client.
///
/// Implemented by the status template engine. Called at most once per
/// address among concurrent lookups; an error is returned to every waiting
/// caller and is not cached.
#[async_trait]
pub trait ResponseEngine: Send + Sync + 'static {
    /// The computed response handed back to the host.
    type Response: Clone + Send + Sync + 'static;

    async fn compute(&self, client: IpAddr) -> Result<Self::Response>;
}

struct EngineLoader<E> {
    engine: Arc<E>,
}

#[async_trait]
impl<E: ResponseEngine> Loader<IpAddr, E::Response> for EngineLoader<E> {
    async fn load(&self, client: &IpAddr) -> Result<E::Response> {
        self.engine.compute(*client).await
    }
}

/// Outcome of [`RequestCache::reconfigure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconfigured {
    /// Same policy string as before; the live cache was kept.
    Unchanged,
    /// A new cache was built from the requested policy.
    Rebuilt,
    /// The requested policy was invalid; a new cache was built from the
    /// default policy.
    FellBack(CacheSpecError),
}

struct Generation<R> {
    /// The string the configuration asked for.
    requested: String,
    /// The string the live cache was actually built from.
    effective: String,
    cache: LoadingCache<IpAddr, R>,
}

/// Live, reconfigurable cache of status responses.
pub struct RequestCache<E: ResponseEngine> {
    current: ArcSwap<Generation<E::Response>>,
    reconfigure_lock: Mutex<()>,
}

impl<E: ResponseEngine> RequestCache<E> {
    /// Build the initial cache. Never fails; an invalid `spec` falls back to
    /// the default policy.
    pub fn new(engine: Arc<E>, spec: &str) -> Self {
        let loader: Arc<dyn Loader<IpAddr, E::Response>> = Arc::new(EngineLoader { engine });
        let (parsed, effective, _) = resolve(spec);
        let generation = Generation {
            requested: spec.to_string(),
            effective,
            cache: LoadingCache::new(CACHE_NAME, &parsed, loader),
        };
        debug!(spec = %generation.effective, "request cache created");

        Self {
            current: ArcSwap::from_pointee(generation),
            reconfigure_lock: Mutex::new(()),
        }
    }

    /// Return the response for `client`, computing it on a miss.
    pub async fn lookup(&self, client: IpAddr) -> Result<E::Response> {
        let generation = self.current.load_full();
        generation.cache.get(&client).await
    }

    /// Apply a (possibly unchanged) policy string.
    ///
    /// Concurrent calls are serialized. When this returns, the new cache is
    /// live and the old one has been emptied.
    pub async fn reconfigure(&self, spec: &str) -> Reconfigured {
        let _guard = self.reconfigure_lock.lock().await;

        let old = self.current.load_full();
        if old.requested == spec || old.effective == spec {
            return Reconfigured::Unchanged;
        }

        debug!("deleting old request cache due to configuration changes");
        let (parsed, effective, outcome) = resolve(spec);
        let next = Generation {
            requested: spec.to_string(),
            effective,
            cache: old.cache.rebuild(&parsed),
        };
        debug!(spec = %next.effective, "request cache created");
        self.current.store(Arc::new(next));

        old.cache.invalidate_all();
        old.cache.cleanup().await;

        let label = match outcome {
            Reconfigured::FellBack(_) => "fallback",
            _ => "rebuilt",
        };
        metrics::counter!(
            telemetry::CACHE_REBUILDS_TOTAL,
            "cache" => CACHE_NAME,
            "outcome" => label
        )
        .increment(1);
        outcome
    }

    /// Policy string the live cache was built from.
    pub fn current_spec(&self) -> String {
        self.current.load().effective.clone()
    }

    /// Policy string most recently requested by configuration.
    pub fn requested_spec(&self) -> String {
        self.current.load().requested.clone()
    }

    /// Parsed policy of the live cache.
    pub fn policy(&self) -> CacheSpec {
        self.current.load().cache.spec().clone()
    }

    pub fn entry_count(&self) -> u64 {
        self.current.load().cache.entry_count()
    }

    /// Whether a response for `client` is currently cached.
    pub fn contains(&self, client: &IpAddr) -> bool {
        self.current.load().cache.contains(client)
    }

    /// Apply pending evictions on the live cache.
    pub async fn cleanup(&self) {
        self.current.load_full().cache.cleanup().await;
    }

    /// Drop every cached response without changing the policy.
    pub fn invalidate_all(&self) {
        self.current.load().cache.invalidate_all();
    }
}

/// Parse `spec`, falling back to the default policy on error.
fn resolve(spec: &str) -> (CacheSpec, String, Reconfigured) {
    match CacheSpec::parse(spec) {
        Ok(parsed) => (parsed, spec.to_string(), Reconfigured::Rebuilt),
        Err(err) => {
            error!(
                spec,
                error = %err,
                default = DEFAULT_REQUEST_SPEC,
                "unable to create request cache using configuration settings, using default"
            );
            (
                default_request_spec(),
                DEFAULT_REQUEST_SPEC.to_string(),
                Reconfigured::FellBack(err),
            )
        }
    }
}
