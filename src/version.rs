//! Build metadata embedded by `build.rs`.
//!
//! Outside a git checkout every git field reads "unknown".

use std::fmt;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const UNKNOWN: &str = "unknown";

/// Where and when this build came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub sha: &'static str,
    pub dirty: bool,
    pub built_at: Option<&'static str>,
}

/// Metadata of the running build.
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: PKG_VERSION,
        branch: option_env!("VERGEN_GIT_BRANCH").unwrap_or(UNKNOWN),
        sha: option_env!("VERGEN_GIT_SHA").unwrap_or(UNKNOWN),
        dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
        built_at: option_env!("VERGEN_BUILD_TIMESTAMP"),
    }
}

impl BuildInfo {
    /// First seven characters of the commit SHA.
    pub fn short_sha(&self) -> &'static str {
        &self.sha[..7.min(self.sha.len())]
    }
}

/// `{version}+{branch}.{sha}`, with `.dirty` appended for dirty trees.
impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}.{}", self.version, self.branch, self.short_sha())?;
        if self.dirty {
            f.write_str(".dirty")?;
        }
        Ok(())
    }
}

/// Full version string of the running build, e.g. `0.1.0+main.abc1234`.
pub fn version_string() -> String {
    build_info().to_string()
}
