//! pingcache error types

use crate::spec::CacheSpecError;

/// pingcache error types
///
/// `Clone` because a single failed load is shared by every caller that was
/// waiting on the same cache key.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PingCacheError {
    // Configuration errors
    #[error("invalid cache spec: {0}")]
    InvalidCacheSpec(#[from] CacheSpecError),

    #[error("configuration error: {0}")]
    Configuration(String),

    // Collaborator errors
    /// The response engine could not compute a status response.
    #[error("response engine error: {0}")]
    Engine(String),

    /// The icon decoder rejected a favicon source. Never escapes a favicon
    /// lookup; it is turned into a cached negative result.
    #[error("favicon decode error: {0}")]
    Decode(String),

    #[error("failed to toggle status hook '{hook}': {message}")]
    Hook { hook: String, message: String },

    #[error("listener error: {0}")]
    Listener(String),

    #[error("statistics error: {0}")]
    Statistics(String),
}

/// Result type alias for pingcache operations
pub type Result<T> = std::result::Result<T, PingCacheError>;
