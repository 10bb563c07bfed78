//! Environment-style configuration for the entropy manager.
//!
//! All knobs have defaults; the environment only overrides them:
//!
//! - `MICRAND_DEBUG` — enable debug logging (`1`/`true`/`yes`).
//! - `MICRAND_DEVICE_INDEX` — force a specific input device before auto-scan.
//! - `MICRAND_RETRY_SECS` — minimum seconds between recovery attempts once
//!   the source is degraded.

use std::time::Duration;

/// Default minimum interval between recovery attempts in fallback mode.
pub const DEFAULT_RETRY_SECS: u64 = 30;

/// Parameters for a device probe burst.
///
/// The burst count and chunk size have no derived statistical justification;
/// they are tunable with these defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeParams {
    /// Number of chunks captured during a probe.
    pub bursts: usize,
    /// Frames per captured chunk.
    pub chunk_frames: usize,
}

impl Default for ProbeParams {
    fn default() -> Self {
        Self {
            bursts: 3,
            chunk_frames: 1024,
        }
    }
}

/// Manager configuration, normally built with [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Verbose logging requested via `MICRAND_DEBUG`.
    pub debug_logging: bool,
    /// Device index to probe before auto-scanning, via `MICRAND_DEVICE_INDEX`.
    pub manual_device_index: Option<usize>,
    /// Minimum interval between recovery attempts while degraded.
    pub retry_interval: Duration,
    /// Probe burst parameters.
    pub probe: ProbeParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_logging: false,
            manual_device_index: None,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_SECS),
            probe: ProbeParams::default(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Malformed values are ignored in favor of the defaults rather than
    /// failing startup; a random-number service should come up even when an
    /// operator typos an override.
    pub fn from_env() -> Self {
        let debug_logging = std::env::var("MICRAND_DEBUG")
            .ok()
            .map(|v| parse_bool(&v))
            .unwrap_or(false);
        let manual_device_index = std::env::var("MICRAND_DEVICE_INDEX")
            .ok()
            .and_then(|v| parse_index(&v));
        let retry_interval = std::env::var("MICRAND_RETRY_SECS")
            .ok()
            .and_then(|v| parse_secs(&v))
            .unwrap_or(Duration::from_secs(DEFAULT_RETRY_SECS));

        Self {
            debug_logging,
            manual_device_index,
            retry_interval,
            probe: ProbeParams::default(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_index(value: &str) -> Option<usize> {
    match value.trim().parse::<usize>() {
        Ok(idx) => Some(idx),
        Err(_) => {
            log::warn!("ignoring malformed MICRAND_DEVICE_INDEX: {value:?}");
            None
        }
    }
}

fn parse_secs(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            log::warn!("ignoring malformed MICRAND_RETRY_SECS: {value:?}");
            None
        }
    }
}
