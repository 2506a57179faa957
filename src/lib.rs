//! pingcache - status ping caching for game servers
//!
//! This crate sits between a game server's status/ping handling and the
//! engine that computes customized status responses. It keeps two
//! self-loading caches (responses per client address, decoded favicons per
//! source), rebuilds them live when the configuration changes, and
//! registers the host's status interception hooks only while the
//! configuration needs them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::net::IpAddr;
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use pingcache::{
//!     Config, IconDecoder, IconSource, ResponseEngine, Result, StatusContext, StatusHook,
//! };
//!
//! struct Motd;
//!
//! #[async_trait]
//! impl ResponseEngine for Motd {
//!     type Response = String;
//!
//!     async fn compute(&self, client: IpAddr) -> Result<String> {
//!         Ok(format!("Welcome back, {client}!"))
//!     }
//! }
//!
//! struct Icons;
//!
//! #[async_trait]
//! impl IconDecoder for Icons {
//!     type Icon = Vec<u8>;
//!
//!     async fn decode(&self, source: &IconSource) -> Result<Vec<u8>> {
//!         std::fs::read(&source.location)
//!             .map_err(|e| pingcache::PingCacheError::Decode(e.to_string()))
//!     }
//! }
//!
//! struct PingEvent;
//!
//! impl StatusHook for PingEvent {
//!     fn name(&self) -> &str {
//!         "ping-event"
//!     }
//!     fn register(&self) -> Result<()> {
//!         Ok(())
//!     }
//!     fn unregister(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> pingcache::Result<()> {
//!     let context = StatusContext::builder(Arc::new(Motd), Arc::new(Icons), Arc::new(PingEvent))
//!         .build();
//!
//!     context
//!         .config_changed(&Config::default().with_customization(true))
//!         .await;
//!
//!     let motd = context.lookup("127.0.0.1".parse().unwrap()).await?;
//!     let icon = context.lookup_icon(&IconSource::file("server-icon.png")).await;
//!     println!("{motd} (icon: {})", icon.is_present());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod spec;
pub mod stats;
pub mod telemetry;
pub mod tracking;
mod version;

// Re-export main types at crate root
pub use cache::{
    CachedIcon, FaviconCache, IconDecoder, IconKind, IconSource, LoadingCache, Reconfigured,
    RequestCache, ResponseEngine,
};
pub use config::Config;
pub use context::{ReloadReport, StatusContext, StatusContextBuilder};
pub use error::{PingCacheError, Result};
pub use handlers::{HandlerReactor, HandlerState, StatusHook};
pub use spec::{CacheSpec, CacheSpecError};
pub use stats::StatsReporter;
pub use tracking::{
    IdentityObserver, IdentityStore, ListenerHost, LoginEvent, LoginPhase, PlayerIdentity,
    VerificationMode,
};
pub use version::{BuildInfo, PKG_VERSION, build_info, version_string};
