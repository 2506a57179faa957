//! Telemetry metric name constants.
//!
//! Centralised metric names for pingcache. Consumers install their own
//! `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `pingcache_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `cache` — cache name: "request" or "favicon"
//! - `outcome` — rebuild outcome: "rebuilt" or "fallback"
//! - `hook` — status hook name
//! - `direction` — hook transition: "register" or "unregister"

/// Total cache hits. Only emitted for caches whose spec has `recordStats`.
///
/// Labels: `cache`.
pub const CACHE_HITS_TOTAL: &str = "pingcache_cache_hits_total";

/// Total cache misses: lookups that found no cached value, including those
/// that waited on another lookup's load. Only emitted for caches whose spec
/// has `recordStats`.
///
/// Labels: `cache`.
pub const CACHE_MISSES_TOTAL: &str = "pingcache_cache_misses_total";

/// Total loads that failed and were therefore not cached.
///
/// Labels: `cache`.
pub const CACHE_LOAD_FAILURES_TOTAL: &str = "pingcache_cache_load_failures_total";

/// Total cache instance rebuilds caused by reconfiguration.
///
/// Labels: `cache`, `outcome` ("rebuilt" | "fallback").
pub const CACHE_REBUILDS_TOTAL: &str = "pingcache_cache_rebuilds_total";

/// Total status hook registration transitions.
///
/// Labels: `hook`, `direction` ("register" | "unregister").
pub const HANDLER_TRANSITIONS_TOTAL: &str = "pingcache_handler_transitions_total";
