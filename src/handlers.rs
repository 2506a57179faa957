//! Status hook registration.
//!
//! The host answers status pings on its own unless something intercepts
//! them. [`HandlerReactor`] registers the interception hooks only while the
//! configuration actually customizes the response, and unregisters them
//! otherwise.
//!
//! There are two hooks:
//!
//! - **basic** — the host's own ping event; always available.
//! - **extended** — protocol-level interception, which needs an optional
//!   dependency on the host. Whether it is present is decided once, when the
//!   reactor is built, by passing or omitting the hook.
//!
//! Registration is idempotent and tracked per hook. A hook whose
//! registration fails stays unregistered.

use std::sync::Arc;

use tracing::{debug, error};

use crate::Result;
use crate::telemetry;

/// A registration point with the host's status handling.
pub trait StatusHook: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    fn register(&self) -> Result<()>;

    fn unregister(&self) -> Result<()>;
}

/// Registration state of both hooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerState {
    pub basic_registered: bool,
    pub extended_registered: bool,
}

struct HookSlot {
    hook: Arc<dyn StatusHook>,
    registered: bool,
}

impl HookSlot {
    fn new(hook: Arc<dyn StatusHook>) -> Self {
        Self {
            hook,
            registered: false,
        }
    }

    /// Returns `true` if the hook went from unregistered to registered.
    fn register(&mut self) -> bool {
        if self.registered {
            return false;
        }
        match self.hook.register() {
            Ok(()) => {
                self.registered = true;
                debug!(hook = self.hook.name(), "registered status hook");
                self.record("register");
                true
            }
            Err(err) => {
                error!(hook = self.hook.name(), error = %err, "failed to register status hook");
                false
            }
        }
    }

    /// Returns `true` if the hook went from registered to unregistered.
    fn unregister(&mut self) -> bool {
        if !self.registered {
            return false;
        }
        match self.hook.unregister() {
            Ok(()) => {
                self.registered = false;
                debug!(hook = self.hook.name(), "unregistered status hook");
                self.record("unregister");
                true
            }
            Err(err) => {
                error!(hook = self.hook.name(), error = %err, "failed to unregister status hook");
                false
            }
        }
    }

    fn record(&self, direction: &'static str) {
        metrics::counter!(
            telemetry::HANDLER_TRANSITIONS_TOTAL,
            "hook" => self.hook.name().to_string(),
            "direction" => direction
        )
        .increment(1);
    }
}

/// The set of hooks the host can offer, fixed at construction.
trait HandlerSet: Send {
    fn activate(&mut self);
    fn deactivate(&mut self);
    fn state(&self) -> HandlerState;
    fn extended_available(&self) -> bool;
}

/// Extended hook dependency missing: only the basic hook exists.
struct BasicHandlers {
    basic: HookSlot,
}

impl HandlerSet for BasicHandlers {
    fn activate(&mut self) {
        self.basic.register();
        error!(
            "extended status hook is unavailable (dependency not installed); \
             most status customizations will not work"
        );
    }

    fn deactivate(&mut self) {
        self.basic.unregister();
    }

    fn state(&self) -> HandlerState {
        HandlerState {
            basic_registered: self.basic.registered,
            extended_registered: false,
        }
    }

    fn extended_available(&self) -> bool {
        false
    }
}

/// Both hooks available.
struct ExtendedHandlers {
    basic: HookSlot,
    extended: HookSlot,
}

impl HandlerSet for ExtendedHandlers {
    fn activate(&mut self) {
        self.basic.register();
        self.extended.register();
    }

    fn deactivate(&mut self) {
        self.basic.unregister();
        self.extended.unregister();
    }

    fn state(&self) -> HandlerState {
        HandlerState {
            basic_registered: self.basic.registered,
            extended_registered: self.extended.registered,
        }
    }

    fn extended_available(&self) -> bool {
        true
    }
}

/// Registers or unregisters status hooks to follow the configuration.
pub struct HandlerReactor {
    handlers: Box<dyn HandlerSet>,
}

impl HandlerReactor {
    /// Build a reactor. Pass `None` for `extended` when the host lacks the
    /// dependency; that decision holds for the reactor's lifetime.
    pub fn new(basic: Arc<dyn StatusHook>, extended: Option<Arc<dyn StatusHook>>) -> Self {
        let handlers: Box<dyn HandlerSet> = match extended {
            Some(extended) => Box::new(ExtendedHandlers {
                basic: HookSlot::new(basic),
                extended: HookSlot::new(extended),
            }),
            None => {
                error!("extended status hook dependency is not installed; running in degraded mode");
                Box::new(BasicHandlers {
                    basic: HookSlot::new(basic),
                })
            }
        };
        Self { handlers }
    }

    /// Bring hook registration in line with `customization_active`.
    pub fn apply(&mut self, customization_active: bool) -> HandlerState {
        if customization_active {
            self.handlers.activate();
        } else {
            self.handlers.deactivate();
        }
        self.handlers.state()
    }

    pub fn state(&self) -> HandlerState {
        self.handlers.state()
    }

    pub fn extended_available(&self) -> bool {
        self.handlers.extended_available()
    }

    /// Unregister every hook.
    pub fn shutdown(&mut self) -> HandlerState {
        self.apply(false)
    }
}
