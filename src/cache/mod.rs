//! Caching subsystem.
//!
//! Two independent self-loading caches, both built on [`LoadingCache`]:
//!
//! - [`RequestCache`] — status responses keyed on client address, computed
//!   by a [`ResponseEngine`]. Always live; an invalid policy falls back to
//!   [`DEFAULT_REQUEST_SPEC`].
//!
//! - [`FaviconCache`] — decoded server icons keyed on [`IconSource`],
//!   produced by an [`IconDecoder`]. Optional; failed decodes are cached as
//!   [`CachedIcon::Absent`].
//!
//! Both managers replace their cache instance wholesale on reconfiguration
//! rather than mutating it, so a lookup always sees one complete instance.

pub mod favicon;
pub mod loading;
pub mod request;

pub use favicon::{
    CachedIcon, DEFAULT_FAVICON_SPEC, FaviconCache, IconDecoder, IconKind, IconSource,
    default_favicon_spec,
};
pub use loading::{Loader, LoadingCache};
pub use request::{
    DEFAULT_REQUEST_SPEC, Reconfigured, RequestCache, ResponseEngine, default_request_spec,
};
