//! Engine configuration.

use core::fmt;
use std::sync::Arc;

use gridlock_policy::PolicyMode;

use crate::clock::{Clock, ClockProvider};

/// Default number of retained event-log entries.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 256;

/// Configuration for [`Engine`](crate::Engine).
///
/// # Example
///
/// ```
/// use gridlock_engine::{Engine, EngineConfig};
/// use gridlock_policy::PolicyMode;
///
/// let config = EngineConfig::new()
///     .with_policy(PolicyMode::Avoidance)
///     .with_event_log_capacity(64);
/// let engine = Engine::new(config);
/// assert_eq!(engine.policy(), PolicyMode::Avoidance);
/// ```
#[derive(Clone)]
pub struct EngineConfig {
    /// The policy active at start. [`Engine::reset`](crate::Engine::reset)
    /// restores it when [`EngineConfig::reset_policy`] is set.
    pub policy: PolicyMode,
    /// Maximum number of retained event-log entries.
    pub event_log_capacity: usize,
    /// Whether `reset()` also restores [`EngineConfig::policy`].
    pub reset_policy: bool,
    clock: Option<Arc<dyn ClockProvider>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: PolicyMode::default(),
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            reset_policy: false,
            clock: None,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyMode) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the event-log capacity. Zero disables the log.
    #[must_use]
    pub fn with_event_log_capacity(mut self, capacity: usize) -> Self {
        self.event_log_capacity = capacity;
        self
    }

    /// Makes `reset()` restore the initial policy.
    #[must_use]
    pub fn with_reset_policy(mut self, reset: bool) -> Self {
        self.reset_policy = reset;
        self
    }

    /// Sets a custom time source for log timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn ClockProvider>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub(crate) fn build_clock(&self) -> Clock {
        match &self.clock {
            Some(provider) => Clock::with_provider(Arc::clone(provider)),
            None => Clock::system(),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("policy", &self.policy)
            .field("event_log_capacity", &self.event_log_capacity)
            .field("reset_policy", &self.reset_policy)
            .field("custom_clock", &self.clock.is_some())
            .finish()
    }
}
