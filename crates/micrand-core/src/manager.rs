//! The entropy-source manager.
//!
//! One `RngManager` is constructed at service startup, shared by `Arc`, and
//! owns all mutable source state: health, the selected device index, and the
//! single open capture stream. A single mutex serializes the whole
//! acquire-read-close sequence, so concurrent callers are serialized at the
//! hardware boundary no matter how they were dispatched.
//!
//! The public surface never fails: hardware errors degrade the source to the
//! PRNG fallback and the caller still gets a number. Total and permanent
//! unavailability of hardware is a steady state here, not a fatal condition.

use std::sync::Mutex;

use crate::backend::{AudioBackend, CaptureSpec, CaptureStream, CpalBackend};
use crate::config::Config;
use crate::extract;
use crate::fallback::FallbackGenerator;
use crate::recovery::{Clock, SourceHealth, SystemClock, should_retry};
use crate::select::select_device;

/// Where a returned number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Microphone,
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State guarded by the manager's lock.
struct Inner {
    health: SourceHealth,
    selected: Option<usize>,
    stream: Option<Box<dyn CaptureStream>>,
    shut_down: bool,
}

/// Microphone-backed random number manager with PRNG fallback.
pub struct RngManager {
    backend: Box<dyn AudioBackend>,
    clock: Box<dyn Clock>,
    config: Config,
    inner: Mutex<Inner>,
    fallback: Mutex<FallbackGenerator>,
}

impl RngManager {
    /// Build a manager over the host audio subsystem and run the initial
    /// device scan.
    pub fn new(config: Config) -> Self {
        Self::with_parts(Box::new(CpalBackend::new()), Box::new(SystemClock), config)
    }

    /// Build a manager with injected backend and clock (tests, embedders).
    pub fn with_parts(
        backend: Box<dyn AudioBackend>,
        clock: Box<dyn Clock>,
        config: Config,
    ) -> Self {
        let manager = Self {
            backend,
            clock,
            config,
            inner: Mutex::new(Inner {
                health: SourceHealth::degraded(),
                selected: None,
                stream: None,
                shut_down: false,
            }),
            fallback: Mutex::new(FallbackGenerator::new()),
        };
        {
            let mut inner = manager.inner.lock().unwrap();
            manager.run_selection(&mut inner);
        }
        manager
    }

    /// One probing pass. Updates the recovery timestamp regardless of
    /// outcome so a dead microphone costs one pass per retry interval.
    fn run_selection(&self, inner: &mut Inner) {
        match select_device(self.backend.as_ref(), &self.config) {
            Some(index) => {
                inner.selected = Some(index);
                inner.health = SourceHealth::Healthy;
            }
            None => {
                inner.selected = None;
                inner.health = SourceHealth::Degraded {
                    last_attempt: Some(self.clock.now()),
                };
            }
        }
    }

    /// Close the stream (if any) and enter fallback mode. The failed attempt
    /// counts as a recovery attempt for retry gating.
    fn mark_degraded(&self, inner: &mut Inner) {
        if let Some(mut stream) = inner.stream.take() {
            stream.close();
        }
        inner.health = SourceHealth::Degraded {
            last_attempt: Some(self.clock.now()),
        };
    }

    /// Source acquisition state machine: recover if due, then reuse or open
    /// the capture stream. Never touches hardware while degraded and not due
    /// for a retry.
    fn acquire(&self, inner: &mut Inner) -> Source {
        if inner.shut_down {
            return Source::Fallback;
        }

        if should_retry(&inner.health, self.clock.now(), self.config.retry_interval) {
            self.run_selection(inner);
        }
        if inner.health != SourceHealth::Healthy {
            return Source::Fallback;
        }
        if inner.stream.is_some() {
            return Source::Microphone;
        }

        let Some(index) = inner.selected else {
            // Healthy without a selection would violate the mode invariant.
            self.mark_degraded(inner);
            return Source::Fallback;
        };
        let spec = CaptureSpec {
            chunk_frames: self.config.probe.chunk_frames,
            ..CaptureSpec::default()
        };
        match self.backend.open(index, &spec) {
            Ok(stream) => {
                inner.stream = Some(stream);
                Source::Microphone
            }
            Err(e) => {
                log::warn!("failed to open selected device {index}: {e}");
                self.mark_degraded(inner);
                Source::Fallback
            }
        }
    }

    /// Produce one number in [0, 1) and report which path produced it.
    ///
    /// Extraction failures degrade silently to the fallback PRNG; this never
    /// fails and never blocks on hardware while degraded.
    pub fn random_with_source(&self) -> (f64, Source) {
        let mut inner = self.inner.lock().unwrap();
        if let Source::Microphone = self.acquire(&mut inner) {
            if let Some(stream) = inner.stream.as_mut() {
                match extract::read_digest(stream.as_mut()) {
                    Ok(digest) => {
                        return (extract::digest_to_unit(&digest), Source::Microphone);
                    }
                    Err(e) => {
                        log::warn!("entropy read failed, degrading to fallback: {e}");
                        self.mark_degraded(&mut inner);
                    }
                }
            }
        }
        drop(inner);
        (self.fallback.lock().unwrap().next_f64(), Source::Fallback)
    }

    /// Produce one number in [0, 1). Never fails.
    pub fn random_number(&self) -> f64 {
        self.random_with_source().0
    }

    /// Current source, reflecting a fresh acquisition attempt (recovery and
    /// stream opening included, like a request would see).
    pub fn current_source(&self) -> Source {
        let mut inner = self.inner.lock().unwrap();
        self.acquire(&mut inner)
    }

    /// Non-blocking view of the mode. Does not touch hardware; used by the
    /// service layer for error payloads when the lock may be held by a
    /// stuck hardware read.
    pub fn source_hint(&self) -> Source {
        match self.inner.try_lock() {
            Ok(inner) if !inner.shut_down && inner.health == SourceHealth::Healthy => {
                Source::Microphone
            }
            Ok(_) => Source::Fallback,
            // Lock held: a microphone read is in flight.
            Err(_) => Source::Microphone,
        }
    }

    /// Release the capture stream. Idempotent; after shutdown only the
    /// fallback path answers.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(mut stream) = inner.stream.take() {
            stream.close();
        }
        inner.shut_down = true;
    }
}

impl Drop for RngManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
