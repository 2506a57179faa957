//! Favicon cache, keyed on icon source.
//!
//! Decoding a server icon (reading a file, fetching a URL, rendering a
//! player head) is expensive and may fail permanently. [`FaviconCache`]
//! caches both outcomes: a decoded icon is stored as
//! [`CachedIcon::Present`], a failed decode as [`CachedIcon::Absent`] so the
//! broken source is not retried on every ping.
//!
//! A cached `Absent` only clears when the cache is rebuilt by the next
//! configuration reload, even if the source has since been fixed.
//!
//! The cache may be disabled entirely (no favicons configured); lookups then
//! return `Absent` without touching the decoder.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::loading::{Loader, LoadingCache};
use crate::Result;
use crate::spec::CacheSpec;
use crate::telemetry;

/// Policy used when the configured favicon cache spec is invalid.
pub const DEFAULT_FAVICON_SPEC: &str = "expireAfterWrite=6h, maximumSize=25";

const CACHE_NAME: &str = "favicon";

/// Parsed form of [`DEFAULT_FAVICON_SPEC`].
pub fn default_favicon_spec() -> CacheSpec {
    CacheSpec {
        maximum_size: Some(25),
        expire_after_write: Some(Duration::from_secs(6 * 3600)),
        ..CacheSpec::default()
    }
}

/// Where an icon comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    /// Image file on the server's disk.
    File,
    /// Image downloaded from a URL.
    Url,
    /// Face of a player skin, looked up by player name.
    PlayerHead,
    /// Face of a player skin including the hat layer.
    PlayerHelm,
    /// Base64-encoded image data.
    Encoded,
}

impl IconKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
            Self::PlayerHead => "head",
            Self::PlayerHelm => "helm",
            Self::Encoded => "encoded",
        }
    }
}

/// Cache key for a favicon: the kind of source plus its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconSource {
    pub kind: IconKind,
    pub location: String,
}

impl IconSource {
    pub fn new(kind: IconKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self::new(IconKind::File, path)
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::new(IconKind::Url, url)
    }

    pub fn player_head(player: impl Into<String>) -> Self {
        Self::new(IconKind::PlayerHead, player)
    }

    pub fn player_helm(player: impl Into<String>) -> Self {
        Self::new(IconKind::PlayerHelm, player)
    }

    pub fn encoded(data: impl Into<String>) -> Self {
        Self::new(IconKind::Encoded, data)
    }
}

impl fmt::Display for IconSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            // Don't dump whole images into logs.
            IconKind::Encoded => write!(f, "encoded:<{} bytes>", self.location.len()),
            kind => write!(f, "{}:{}", kind.as_str(), self.location),
        }
    }
}

/// Cached outcome of decoding an icon source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedIcon<I> {
    /// The source decoded into a host icon.
    Present(I),
    /// Decoding failed, or favicons are disabled.
    Absent,
}

impl<I> CachedIcon<I> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_ref(&self) -> Option<&I> {
        match self {
            Self::Present(icon) => Some(icon),
            Self::Absent => None,
        }
    }

    pub fn into_option(self) -> Option<I> {
        match self {
            Self::Present(icon) => Some(icon),
            Self::Absent => None,
        }
    }
}

/// Loads and encodes an icon into the host's native representation.
#[async_trait]
pub trait IconDecoder: Send + Sync + 'static {
    /// Host-native encoded icon handle.
    type Icon: Clone + Send + Sync + 'static;

    async fn decode(&self, source: &IconSource) -> Result<Self::Icon>;
}

struct DecoderLoader<D> {
    decoder: Arc<D>,
}

#[async_trait]
impl<D: IconDecoder> Loader<IconSource, CachedIcon<D::Icon>> for DecoderLoader<D> {
    async fn load(&self, source: &IconSource) -> Result<CachedIcon<D::Icon>> {
        match self.decoder.decode(source).await {
            Ok(icon) => Ok(CachedIcon::Present(icon)),
            Err(err) => {
                debug!(%source, error = %err, "unable to load favicon, caching as absent");
                Ok(CachedIcon::Absent)
            }
        }
    }
}

type IconCache<I> = LoadingCache<IconSource, CachedIcon<I>>;

/// Live, optional cache of decoded favicons.
pub struct FaviconCache<D: IconDecoder> {
    current: ArcSwapOption<IconCache<D::Icon>>,
    loader: Arc<dyn Loader<IconSource, CachedIcon<D::Icon>>>,
    reconfigure_lock: Mutex<()>,
}

impl<D: IconDecoder> FaviconCache<D> {
    /// Create a disabled favicon cache. Enable it with
    /// [`reconfigure`](Self::reconfigure).
    pub fn new(decoder: Arc<D>) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            loader: Arc::new(DecoderLoader { decoder }),
            reconfigure_lock: Mutex::new(()),
        }
    }

    /// Return the cached icon for `source`, decoding it on a miss.
    ///
    /// Never fails: decode errors and a disabled cache both yield
    /// [`CachedIcon::Absent`].
    pub async fn lookup(&self, source: &IconSource) -> CachedIcon<D::Icon> {
        let Some(cache) = self.current.load_full() else {
            return CachedIcon::Absent;
        };
        match cache.get(source).await {
            Ok(icon) => icon,
            Err(err) => {
                // The loader turns decode failures into values; anything
                // else is unexpected but still must not reach the host.
                warn!(%source, error = %err, "favicon lookup failed");
                CachedIcon::Absent
            }
        }
    }

    /// Enable the cache with a new policy, or disable it with `None`.
    ///
    /// Enabling always builds a fresh instance, discarding every cached
    /// icon (including cached failures).
    pub async fn reconfigure(&self, spec: Option<&CacheSpec>) {
        let _guard = self.reconfigure_lock.lock().await;

        let next = spec.map(|spec| {
            Arc::new(LoadingCache::new(
                CACHE_NAME,
                spec,
                Arc::clone(&self.loader),
            ))
        });
        let enabled = next.is_some();
        let old = self.current.swap(next);

        if let Some(old) = old {
            debug!("deleting old favicon cache");
            old.invalidate_all();
            old.cleanup().await;
        }

        if enabled {
            debug!("favicon cache created");
            metrics::counter!(
                telemetry::CACHE_REBUILDS_TOTAL,
                "cache" => CACHE_NAME,
                "outcome" => "rebuilt"
            )
            .increment(1);
        } else {
            debug!("favicon cache disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.current.load_full().is_some()
    }

    /// Parsed policy of the live cache, if enabled.
    pub fn policy(&self) -> Option<CacheSpec> {
        self.current
            .load_full()
            .map(|cache| cache.spec().clone())
    }

    pub fn entry_count(&self) -> u64 {
        self.current
            .load_full()
            .map_or(0, |cache| cache.entry_count())
    }

    /// Apply pending evictions on the live cache.
    pub async fn cleanup(&self) {
        if let Some(cache) = self.current.load_full() {
            cache.cleanup().await;
        }
    }

    /// Drop every cached icon without changing the policy.
    pub fn invalidate_all(&self) {
        if let Some(cache) = self.current.load_full() {
            cache.invalidate_all();
        }
    }
}
