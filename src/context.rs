//! Status context: the caches, hooks and toggles of one running server.
//!
//! [`StatusContext`] is built once at startup, shared (typically in an
//! `Arc`) between the host's ping path and its config-reload path, and shut
//! down with the server. Nothing here is global.
//!
//! ```rust,ignore
//! let context = StatusContext::builder(engine, decoder, ping_event_hook)
//!     .extended_hook(protocol_hook)
//!     .listener_host(events, VerificationMode::Online)
//!     .build();
//!
//! context.config_changed(&Config::load(path)?.with_customization(true)).await;
//! let response = context.lookup(client_addr).await?;
//! let icon = context.lookup_icon(&IconSource::file("server-icon.png")).await;
//! ```

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::Result;
use crate::cache::{
    CachedIcon, DEFAULT_FAVICON_SPEC, DEFAULT_REQUEST_SPEC, FaviconCache, IconDecoder, IconSource,
    Reconfigured, RequestCache, ResponseEngine, default_favicon_spec,
};
use crate::config::Config;
use crate::handlers::{HandlerReactor, HandlerState, StatusHook};
use crate::spec::CacheSpec;
use crate::stats::{StatsReporter, StatsToggle};
use crate::tracking::{IdentityStore, ListenerHost, PlayerTracking, VerificationMode};

/// What a single [`StatusContext::config_changed`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    pub handlers: HandlerState,
    pub request_cache: Reconfigured,
    pub favicons_enabled: bool,
    pub player_tracking: bool,
    pub stats: bool,
}

/// Owner of every piece of per-server status state.
pub struct StatusContext<E: ResponseEngine, D: IconDecoder> {
    requests: RequestCache<E>,
    favicons: FaviconCache<D>,
    handlers: Mutex<HandlerReactor>,
    tracking: Mutex<Option<PlayerTracking>>,
    stats: Mutex<StatsToggle>,
    identities: Arc<IdentityStore>,
    reload_lock: Mutex<()>,
}

impl<E: ResponseEngine, D: IconDecoder> StatusContext<E, D> {
    /// Start building a context around the required collaborators.
    pub fn builder(
        engine: Arc<E>,
        decoder: Arc<D>,
        basic_hook: Arc<dyn StatusHook>,
    ) -> StatusContextBuilder<E, D> {
        StatusContextBuilder::new(engine, decoder, basic_hook)
    }

    /// Status response for a querying client. Engine failures propagate;
    /// the host decides what to answer instead.
    pub async fn lookup(&self, client: IpAddr) -> Result<E::Response> {
        self.requests.lookup(client).await
    }

    /// Favicon for a source. Never fails.
    pub async fn lookup_icon(&self, source: &IconSource) -> CachedIcon<D::Icon> {
        self.favicons.lookup(source).await
    }

    /// Apply a reloaded configuration.
    ///
    /// Reloads are serialized. When this returns every component is in its
    /// new steady state; invalid cache specs have already fallen back.
    pub async fn config_changed(&self, config: &Config) -> ReloadReport {
        let _guard = self.reload_lock.lock().await;

        let handlers = self
            .handlers
            .lock()
            .await
            .apply(config.customization_active);

        let request_cache = self.requests.reconfigure(&config.caches.request).await;

        let favicon_spec = config.favicon_spec().map(resolve_favicon_spec);
        self.favicons.reconfigure(favicon_spec.as_ref()).await;

        let player_tracking = match self.tracking.lock().await.as_mut() {
            Some(tracking) => tracking.apply(config.plugin.player_tracking),
            None => false,
        };

        let stats = self.stats.lock().await.apply(config.plugin.stats);

        let report = ReloadReport {
            handlers,
            request_cache,
            favicons_enabled: favicon_spec.is_some(),
            player_tracking,
            stats,
        };
        debug!(?report, "configuration applied");
        report
    }

    /// Unregister hooks and listeners, stop statistics and drop cached data.
    pub async fn shutdown(&self) {
        let _guard = self.reload_lock.lock().await;

        self.handlers.lock().await.shutdown();
        if let Some(tracking) = self.tracking.lock().await.as_mut() {
            tracking.apply(false);
        }
        self.stats.lock().await.apply(false);
        self.requests.invalidate_all();
        self.favicons.reconfigure(None).await;
        debug!("status context shut down");
    }

    pub fn request_cache(&self) -> &RequestCache<E> {
        &self.requests
    }

    pub fn favicon_cache(&self) -> &FaviconCache<D> {
        &self.favicons
    }

    pub async fn handler_state(&self) -> HandlerState {
        self.handlers.lock().await.state()
    }

    /// Identities captured by player tracking, for the response engine.
    pub fn identities(&self) -> &Arc<IdentityStore> {
        &self.identities
    }
}

/// Parse the favicon policy, falling back to the default on error.
fn resolve_favicon_spec(spec: &str) -> CacheSpec {
    CacheSpec::parse(spec).unwrap_or_else(|err| {
        warn!(
            spec,
            error = %err,
            default = DEFAULT_FAVICON_SPEC,
            "unable to create favicon cache using configuration settings, using default"
        );
        default_favicon_spec()
    })
}

/// Builder for [`StatusContext`].
pub struct StatusContextBuilder<E: ResponseEngine, D: IconDecoder> {
    engine: Arc<E>,
    decoder: Arc<D>,
    basic_hook: Arc<dyn StatusHook>,
    extended_hook: Option<Arc<dyn StatusHook>>,
    listener_host: Option<(Arc<dyn ListenerHost>, VerificationMode)>,
    stats_reporter: Option<Arc<dyn StatsReporter>>,
    identities: Option<Arc<IdentityStore>>,
    request_spec: String,
}

impl<E: ResponseEngine, D: IconDecoder> StatusContextBuilder<E, D> {
    pub fn new(engine: Arc<E>, decoder: Arc<D>, basic_hook: Arc<dyn StatusHook>) -> Self {
        Self {
            engine,
            decoder,
            basic_hook,
            extended_hook: None,
            listener_host: None,
            stats_reporter: None,
            identities: None,
            request_spec: DEFAULT_REQUEST_SPEC.to_string(),
        }
    }

    /// Provide the protocol-level hook. Omit it when the host lacks the
    /// dependency; the context then runs with the basic hook only.
    pub fn extended_hook(mut self, hook: Arc<dyn StatusHook>) -> Self {
        self.extended_hook = Some(hook);
        self
    }

    /// Enable player tracking support through the host's event bus.
    pub fn listener_host(mut self, host: Arc<dyn ListenerHost>, mode: VerificationMode) -> Self {
        self.listener_host = Some((host, mode));
        self
    }

    /// Provide a usage statistics reporter.
    pub fn stats_reporter(mut self, reporter: Arc<dyn StatsReporter>) -> Self {
        self.stats_reporter = Some(reporter);
        self
    }

    /// Share an existing identity store instead of creating one.
    pub fn identity_store(mut self, store: Arc<IdentityStore>) -> Self {
        self.identities = Some(store);
        self
    }

    /// Request cache policy used until the first configuration arrives.
    pub fn request_spec(mut self, spec: impl Into<String>) -> Self {
        self.request_spec = spec.into();
        self
    }

    /// Build the context. Favicons stay disabled until the first
    /// [`config_changed`](StatusContext::config_changed).
    pub fn build(self) -> StatusContext<E, D> {
        let identities = self.identities.unwrap_or_default();
        let tracking = self
            .listener_host
            .map(|(host, mode)| PlayerTracking::new(host, mode, Arc::clone(&identities)));

        StatusContext {
            requests: RequestCache::new(self.engine, &self.request_spec),
            favicons: FaviconCache::new(self.decoder),
            handlers: Mutex::new(HandlerReactor::new(self.basic_hook, self.extended_hook)),
            tracking: Mutex::new(tracking),
            stats: Mutex::new(StatsToggle::new(self.stats_reporter)),
            identities,
            reload_lock: Mutex::new(()),
        }
    }
}
