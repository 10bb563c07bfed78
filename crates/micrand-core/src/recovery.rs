//! Source health tracking and recovery gating.
//!
//! Once the manager degrades to the PRNG fallback it should not hammer the
//! audio subsystem with a probing pass on every request. The health state
//! records when the last recovery attempt happened; [`should_retry`] is a
//! pure function over that state and an injected clock, so the gating logic
//! is testable without wall-clock waits.

use std::time::{Duration, Instant};

/// Clock abstraction so recovery gating can be driven in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests.
pub struct ManualClock {
    base: Instant,
    offset: std::sync::Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: std::sync::Mutex::new(Duration::ZERO),
        }
    }

    /// Move time forward by `step`.
    pub fn advance(&self, step: Duration) {
        *self.offset.lock().unwrap() += step;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

/// Health of the entropy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHealth {
    /// A probed device is selected and known-openable.
    Healthy,
    /// Running on the PRNG fallback. `last_attempt` is the time of the most
    /// recent recovery pass, or `None` before the first one.
    Degraded { last_attempt: Option<Instant> },
}

impl SourceHealth {
    /// Degraded with no recorded recovery attempt.
    pub fn degraded() -> Self {
        Self::Degraded { last_attempt: None }
    }
}

/// Whether a recovery pass (device re-selection) is due.
///
/// True only when degraded and the last attempt is unset or older than
/// `retry_interval`. Healthy sources never retry.
pub fn should_retry(health: &SourceHealth, now: Instant, retry_interval: Duration) -> bool {
    match health {
        SourceHealth::Healthy => false,
        SourceHealth::Degraded { last_attempt: None } => true,
        SourceHealth::Degraded {
            last_attempt: Some(at),
        } => now.duration_since(*at) > retry_interval,
    }
}
