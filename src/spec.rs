//! Cache policy strings.
//!
//! Caches are configured with a compact comma-separated policy string in the
//! familiar cache-builder spec syntax:
//!
//! ```rust
//! # use pingcache::CacheSpec;
//! # use std::time::Duration;
//! let spec: CacheSpec = "expireAfterAccess=6h, maximumSize=1000".parse().unwrap();
//! assert_eq!(spec.maximum_size, Some(1000));
//! assert_eq!(spec.expire_after_access, Some(Duration::from_secs(6 * 3600)));
//! ```
//!
//! Supported keys: `initialCapacity`, `maximumSize`, `concurrencyLevel`,
//! `expireAfterWrite`, `expireAfterAccess` and the flag `recordStats`.
//! Durations are an integer followed by `d`, `h`, `m` or `s`.
//!
//! Parsing is the only place a policy string is interpreted. Callers decide
//! what to do with a [`CacheSpecError`]; the cache managers fall back to a
//! default policy.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Policy keys that exist in the syntax but cannot be honored by the
/// in-memory backend (no weigher, no reference-based eviction, no
/// background refresh).
const UNSUPPORTED_KEYS: &[&str] = &[
    "maximumWeight",
    "weakKeys",
    "weakValues",
    "softValues",
    "refreshAfterWrite",
];

/// Why a policy string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheSpecError {
    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("key '{0}' is not supported by this cache")]
    UnsupportedKey(String),

    #[error("key '{0}' requires a value")]
    MissingValue(String),

    #[error("key '{0}' does not take a value")]
    UnexpectedValue(String),

    #[error("key '{0}' was already set")]
    DuplicateKey(String),

    #[error("invalid number '{value}' for key '{key}'")]
    InvalidNumber { key: String, value: String },

    #[error("invalid duration '{value}' for key '{key}' (expected e.g. 30s, 10m, 6h, 1d)")]
    InvalidDuration { key: String, value: String },
}

/// A parsed, immutable cache policy.
///
/// Compared by value: two specs that differ only in whitespace or key order
/// are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSpec {
    /// Initial table capacity hint.
    pub initial_capacity: Option<usize>,
    /// Maximum number of entries before eviction.
    pub maximum_size: Option<u64>,
    /// Accepted for compatibility with existing configurations; the backend
    /// manages its own concurrency.
    pub concurrency_level: Option<u32>,
    /// Entries expire this long after they were loaded.
    pub expire_after_write: Option<Duration>,
    /// Entries expire this long after they were last read.
    pub expire_after_access: Option<Duration>,
    /// Emit hit/miss metrics for caches built from this spec.
    pub record_stats: bool,
}

impl CacheSpec {
    /// Parse a policy string.
    pub fn parse(spec: &str) -> Result<Self, CacheSpecError> {
        let mut parsed = CacheSpec::default();
        let mut seen: Vec<&str> = Vec::new();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = match entry.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (entry, None),
            };

            if UNSUPPORTED_KEYS.contains(&key) {
                return Err(CacheSpecError::UnsupportedKey(key.to_string()));
            }
            if seen.contains(&key) {
                return Err(CacheSpecError::DuplicateKey(key.to_string()));
            }

            match key {
                "initialCapacity" => {
                    parsed.initial_capacity = Some(parse_number(key, value)?);
                }
                "maximumSize" => {
                    parsed.maximum_size = Some(parse_number(key, value)?);
                }
                "concurrencyLevel" => {
                    parsed.concurrency_level = Some(parse_number(key, value)?);
                }
                "expireAfterWrite" => {
                    parsed.expire_after_write = Some(parse_duration(key, value)?);
                }
                "expireAfterAccess" => {
                    parsed.expire_after_access = Some(parse_duration(key, value)?);
                }
                "recordStats" => {
                    if value.is_some() {
                        return Err(CacheSpecError::UnexpectedValue(key.to_string()));
                    }
                    parsed.record_stats = true;
                }
                other => return Err(CacheSpecError::UnknownKey(other.to_string())),
            }
            seen.push(key);
        }

        Ok(parsed)
    }

    /// Whether the spec bounds the cache at all (size or age).
    pub fn is_bounded(&self) -> bool {
        self.maximum_size.is_some()
            || self.expire_after_write.is_some()
            || self.expire_after_access.is_some()
    }
}

impl FromStr for CacheSpec {
    type Err = CacheSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CacheSpec {
    /// Canonical form, re-parseable by [`CacheSpec::parse`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(n) = self.initial_capacity {
            parts.push(format!("initialCapacity={n}"));
        }
        if let Some(n) = self.maximum_size {
            parts.push(format!("maximumSize={n}"));
        }
        if let Some(n) = self.concurrency_level {
            parts.push(format!("concurrencyLevel={n}"));
        }
        if let Some(d) = self.expire_after_write {
            parts.push(format!("expireAfterWrite={}s", d.as_secs()));
        }
        if let Some(d) = self.expire_after_access {
            parts.push(format!("expireAfterAccess={}s", d.as_secs()));
        }
        if self.record_stats {
            parts.push("recordStats".to_string());
        }
        f.write_str(&parts.join(","))
    }
}

fn require<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str, CacheSpecError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CacheSpecError::MissingValue(key.to_string())),
    }
}

fn parse_number<T: FromStr>(key: &str, value: Option<&str>) -> Result<T, CacheSpecError> {
    let value = require(key, value)?;
    value.parse().map_err(|_| CacheSpecError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_duration(key: &str, value: Option<&str>) -> Result<Duration, CacheSpecError> {
    let value = require(key, value)?;
    let invalid = || CacheSpecError::InvalidDuration {
        key: key.to_string(),
        value: value.to_string(),
    };

    let unit = value.chars().last().ok_or_else(invalid)?;
    let seconds_per_unit = match unit {
        'd' => 24 * 3600,
        'h' => 3600,
        'm' => 60,
        's' => 1,
        _ => return Err(invalid()),
    };
    let amount: u64 = value[..value.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    amount
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_request_spec() {
        let spec = CacheSpec::parse("expireAfterAccess=6h, maximumSize=1000").unwrap();
        assert_eq!(spec.maximum_size, Some(1000));
        assert_eq!(spec.expire_after_access, Some(Duration::from_secs(21_600)));
        assert_eq!(spec.expire_after_write, None);
        assert!(!spec.record_stats);
    }

    #[test]
    fn empty_spec_is_unbounded() {
        let spec = CacheSpec::parse("").unwrap();
        assert_eq!(spec, CacheSpec::default());
        assert!(!spec.is_bounded());
    }

    #[test]
    fn whitespace_and_empty_entries_are_ignored() {
        let spec = CacheSpec::parse(" maximumSize = 5 ,, recordStats ,").unwrap();
        assert_eq!(spec.maximum_size, Some(5));
        assert!(spec.record_stats);
    }

    #[test]
    fn equality_ignores_order() {
        let a = CacheSpec::parse("maximumSize=10,expireAfterWrite=1m").unwrap();
        let b = CacheSpec::parse("expireAfterWrite=60s, maximumSize=10").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duration_units() {
        let spec = CacheSpec::parse("expireAfterWrite=2d,expireAfterAccess=30s").unwrap();
        assert_eq!(spec.expire_after_write, Some(Duration::from_secs(172_800)));
        assert_eq!(spec.expire_after_access, Some(Duration::from_secs(30)));
    }

    #[test]
    fn rejects_unknown_key() {
        assert_eq!(
            CacheSpec::parse("maxSize=10"),
            Err(CacheSpecError::UnknownKey("maxSize".into()))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(CacheSpec::parse("not-a-valid-spec").is_err());
    }

    #[test]
    fn rejects_duplicate_key() {
        assert_eq!(
            CacheSpec::parse("maximumSize=1,maximumSize=2"),
            Err(CacheSpecError::DuplicateKey("maximumSize".into()))
        );
    }

    #[test]
    fn rejects_missing_value() {
        assert_eq!(
            CacheSpec::parse("maximumSize"),
            Err(CacheSpecError::MissingValue("maximumSize".into()))
        );
        assert_eq!(
            CacheSpec::parse("maximumSize="),
            Err(CacheSpecError::MissingValue("maximumSize".into()))
        );
    }

    #[test]
    fn rejects_value_on_flag() {
        assert_eq!(
            CacheSpec::parse("recordStats=true"),
            Err(CacheSpecError::UnexpectedValue("recordStats".into()))
        );
    }

    #[test]
    fn rejects_bad_numbers_and_durations() {
        assert!(matches!(
            CacheSpec::parse("maximumSize=-1"),
            Err(CacheSpecError::InvalidNumber { .. })
        ));
        assert!(matches!(
            CacheSpec::parse("expireAfterWrite=10"),
            Err(CacheSpecError::InvalidDuration { .. })
        ));
        assert!(matches!(
            CacheSpec::parse("expireAfterWrite=h"),
            Err(CacheSpecError::InvalidDuration { .. })
        ));
        assert!(matches!(
            CacheSpec::parse("expireAfterAccess=5w"),
            Err(CacheSpecError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn rejects_unsupported_keys() {
        for key in ["weakKeys", "softValues", "maximumWeight=100", "refreshAfterWrite=1m"] {
            assert!(
                matches!(CacheSpec::parse(key), Err(CacheSpecError::UnsupportedKey(_))),
                "{key} should be unsupported"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        let spec = CacheSpec::parse("maximumSize=10, expireAfterAccess=6h, recordStats").unwrap();
        let reparsed = CacheSpec::parse(&spec.to_string()).unwrap();
        assert_eq!(spec, reparsed);
    }
}
