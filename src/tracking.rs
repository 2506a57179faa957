//! Player identity tracking.
//!
//! When enabled, players that log in are remembered by address so the
//! response engine can greet returning clients by name in the server list.
//!
//! Where the identity is captured depends on how the host verifies players:
//!
//! - **online mode** — the verified identity is known before login
//!   completes; [`PreLoginObserver`] captures it at [`LoginPhase::PreLogin`].
//! - **offline mode** — the identity only settles once the player has
//!   logged in; [`LoginObserver`] captures it at [`LoginPhase::Login`].
//!
//! The observer is picked once with [`observer_for`] when tracking is
//! switched on, not per event.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::Result;

/// Default maximum number of remembered players.
const DEFAULT_IDENTITY_STORE_MAX: u64 = 10_000;

/// A player as seen at login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerIdentity {
    pub uuid: Uuid,
    pub name: String,
}

impl PlayerIdentity {
    pub fn new(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }
}

/// How the host verifies player identities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerificationMode {
    #[default]
    Online,
    Offline,
}

/// Stage of the login sequence an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPhase {
    PreLogin,
    Login,
}

impl fmt::Display for LoginPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreLogin => f.write_str("pre-login"),
            Self::Login => f.write_str("login"),
        }
    }
}

/// A login event forwarded by the host.
#[derive(Debug, Clone)]
pub struct LoginEvent {
    pub phase: LoginPhase,
    pub address: IpAddr,
    pub identity: PlayerIdentity,
}

/// Thread-safe store of the last identity seen per client address.
///
/// Bounded LRU cache (moka) so long-running servers don't grow it without
/// limit. Default capacity: 10,000 entries.
pub struct IdentityStore {
    entries: moka::sync::Cache<IpAddr, PlayerIdentity>,
}

impl IdentityStore {
    /// Create an empty store with the default capacity (10,000).
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_IDENTITY_STORE_MAX)
    }

    /// Create a store with a custom capacity.
    pub fn with_max_entries(max: u64) -> Self {
        Self {
            entries: moka::sync::Cache::new(max),
        }
    }

    /// Remember (or overwrite) the identity for an address.
    pub fn record(&self, address: IpAddr, identity: PlayerIdentity) {
        self.entries.insert(address, identity);
    }

    /// Look up the last identity seen from an address.
    pub fn get(&self, address: &IpAddr) -> Option<PlayerIdentity> {
        self.entries.get(address)
    }

    /// Number of remembered addresses.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everyone.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Captures player identities from host login events.
pub trait IdentityObserver: Send + Sync {
    /// The login phase this observer listens to.
    fn phase(&self) -> LoginPhase;

    /// Handle a login event. Events of other phases are ignored.
    fn observe(&self, event: &LoginEvent);
}

/// Online-mode observer: records verified identities at pre-login.
pub struct PreLoginObserver {
    store: Arc<IdentityStore>,
}

impl PreLoginObserver {
    pub fn new(store: Arc<IdentityStore>) -> Self {
        Self { store }
    }
}

impl IdentityObserver for PreLoginObserver {
    fn phase(&self) -> LoginPhase {
        LoginPhase::PreLogin
    }

    fn observe(&self, event: &LoginEvent) {
        if event.phase == LoginPhase::PreLogin {
            self.store.record(event.address, event.identity.clone());
        }
    }
}

/// Offline-mode observer: records identities once login completes.
pub struct LoginObserver {
    store: Arc<IdentityStore>,
}

impl LoginObserver {
    pub fn new(store: Arc<IdentityStore>) -> Self {
        Self { store }
    }
}

impl IdentityObserver for LoginObserver {
    fn phase(&self) -> LoginPhase {
        LoginPhase::Login
    }

    fn observe(&self, event: &LoginEvent) {
        if event.phase == LoginPhase::Login {
            self.store.record(event.address, event.identity.clone());
        }
    }
}

/// Pick the observer matching the host's verification mode.
pub fn observer_for(
    mode: VerificationMode,
    store: Arc<IdentityStore>,
) -> Arc<dyn IdentityObserver> {
    match mode {
        VerificationMode::Online => Arc::new(PreLoginObserver::new(store)),
        VerificationMode::Offline => Arc::new(LoginObserver::new(store)),
    }
}

/// Host event bus that login observers attach to.
pub trait ListenerHost: Send + Sync {
    fn register_listener(&self, observer: Arc<dyn IdentityObserver>) -> Result<()>;

    fn unregister_listener(&self, observer: &Arc<dyn IdentityObserver>) -> Result<()>;
}

/// Switches identity tracking on and off with the configuration.
///
/// Holds at most one registered observer. Listener failures are logged and
/// leave the previous state in place.
pub struct PlayerTracking {
    host: Arc<dyn ListenerHost>,
    mode: VerificationMode,
    store: Arc<IdentityStore>,
    observer: Option<Arc<dyn IdentityObserver>>,
}

impl PlayerTracking {
    pub fn new(
        host: Arc<dyn ListenerHost>,
        mode: VerificationMode,
        store: Arc<IdentityStore>,
    ) -> Self {
        Self {
            host,
            mode,
            store,
            observer: None,
        }
    }

    /// Register or unregister the observer. Returns whether tracking is on.
    pub fn apply(&mut self, enabled: bool) -> bool {
        match (enabled, self.observer.take()) {
            (true, Some(observer)) => self.observer = Some(observer),
            (true, None) => {
                let observer = observer_for(self.mode, Arc::clone(&self.store));
                match self.host.register_listener(Arc::clone(&observer)) {
                    Ok(()) => {
                        debug!(phase = %observer.phase(), "registered player tracking listener");
                        self.observer = Some(observer);
                    }
                    Err(err) => debug!(error = %err, "failed to register player tracking listener"),
                }
            }
            (false, Some(observer)) => match self.host.unregister_listener(&observer) {
                Ok(()) => debug!("unregistered player tracking listener"),
                Err(err) => {
                    debug!(error = %err, "failed to unregister player tracking listener");
                    self.observer = Some(observer);
                }
            },
            (false, None) => {}
        }
        self.is_enabled()
    }

    pub fn is_enabled(&self) -> bool {
        self.observer.is_some()
    }

    pub fn store(&self) -> &Arc<IdentityStore> {
        &self.store
    }
}
