//! # micrand-core
//!
//! **Random numbers from the air in the room.**
//!
//! `micrand-core` extracts unpredictable bits from an audio input device and
//! maps them to uniform floats in [0, 1), degrading to a PRNG fallback when
//! no usable hardware exists. It is built for a request-response service
//! that must answer within a bounded deadline even when the hardware path is
//! slow, absent, or flaky.
//!
//! ## Quick Start
//!
//! ```no_run
//! use micrand_core::{Config, RngManager};
//!
//! let rng = RngManager::new(Config::from_env());
//!
//! let value = rng.random_number();
//! assert!((0.0..1.0).contains(&value));
//!
//! println!("source: {}", rng.current_source());
//! rng.shutdown();
//! ```
//!
//! ## Architecture
//!
//! Catalog → Probe (variance validation) → Select → Extract (SHA-256 → float)
//!
//! The manager owns the single open capture stream and all source state
//! behind one lock; concurrent callers are serialized at the hardware
//! boundary. Read errors and absent devices are never surfaced to the
//! caller — they downgrade the source and a recovery pass re-scans devices
//! at most once per retry interval.

pub mod backend;
pub mod config;
pub mod device;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod manager;
pub mod probe;
pub mod recovery;
pub mod select;
pub mod silence;
pub mod variance;

pub use backend::{AudioBackend, CaptureSpec, CaptureStream, CpalBackend};
pub use config::{Config, DEFAULT_RETRY_SECS, ProbeParams};
pub use device::Device;
pub use error::RngError;
pub use extract::{SAMPLE_BYTES, digest_to_unit, read_digest};
pub use fallback::FallbackGenerator;
pub use manager::{RngManager, Source};
pub use probe::probe_device;
pub use recovery::{Clock, ManualClock, SourceHealth, SystemClock, should_retry};
pub use select::select_device;
pub use silence::StderrSilencer;
pub use variance::has_variance;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
