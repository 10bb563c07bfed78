//! Error taxonomy for the entropy-source manager.
//!
//! Hardware-path errors never escape [`crate::RngManager::random_number`];
//! they are absorbed internally and downgrade the source to the PRNG
//! fallback. The variants exist so the probing and acquisition layers can
//! pattern-match on what went wrong and log accordingly.

use thiserror::Error;

/// Error type for entropy extraction and device management.
#[derive(Debug, Error)]
pub enum RngError {
    /// No candidate input device passed variance probing.
    #[error("no usable audio input device found")]
    NoDeviceFound,

    /// A capture stream could not be opened on the requested device.
    #[error("failed to open capture device: {0}")]
    DeviceOpenFailure(String),

    /// An open capture stream failed to deliver samples.
    #[error("failed to read from capture device: {0}")]
    DeviceReadFailure(String),

    /// A probe burst showed no signal variance (silent/constant device).
    #[error("probe burst shows no signal variance")]
    VarianceRejected,

    /// The device reports a sample format the capture path cannot convert.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
}
