//! Usage statistics toggle.
//!
//! Reporting itself lives outside this crate. Failures here are never
//! allowed to disturb status handling: they are logged at debug level and
//! the toggle keeps its previous state.

use std::sync::Arc;

use tracing::debug;

use crate::Result;

/// Host-provided usage statistics reporter.
pub trait StatsReporter: Send + Sync {
    fn enable(&self) -> Result<()>;

    fn disable(&self) -> Result<()>;
}

/// Tracks whether statistics reporting is running.
pub struct StatsToggle {
    reporter: Option<Arc<dyn StatsReporter>>,
    enabled: bool,
}

impl StatsToggle {
    /// `None` means the host offers no reporter; `apply` is then a no-op.
    pub fn new(reporter: Option<Arc<dyn StatsReporter>>) -> Self {
        Self {
            reporter,
            enabled: false,
        }
    }

    /// Start or stop reporting. Returns whether reporting is running.
    pub fn apply(&mut self, wanted: bool) -> bool {
        let Some(reporter) = &self.reporter else {
            return false;
        };
        if wanted == self.enabled {
            return self.enabled;
        }

        let result = if wanted {
            reporter.enable()
        } else {
            reporter.disable()
        };
        match result {
            Ok(()) => {
                self.enabled = wanted;
                debug!(enabled = wanted, "toggled plugin statistics");
            }
            Err(err) => debug!(
                enabled = wanted,
                error = %err,
                "failed to toggle plugin statistics"
            ),
        }
        self.enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
