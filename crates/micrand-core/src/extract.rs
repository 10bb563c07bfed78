//! Entropy extraction: raw sample bytes → SHA-256 digest → unit float.

use sha2::{Digest, Sha256};

use crate::backend::CaptureStream;
use crate::error::RngError;

/// Bytes read from the stream per extracted number.
pub const SAMPLE_BYTES: usize = 4;

/// Read one sample from the open stream and compress it to a digest.
///
/// Read errors surface as [`RngError::DeviceReadFailure`]; the caller is
/// responsible for degrading the source.
pub fn read_digest(stream: &mut dyn CaptureStream) -> Result<[u8; 32], RngError> {
    let raw = stream.read(SAMPLE_BYTES)?;
    let mut hasher = Sha256::new();
    hasher.update(&raw);
    Ok(hasher.finalize().into())
}

/// Map a digest to a float in [0, 1).
///
/// The digest is interpreted as an unsigned 256-bit big-endian integer
/// divided by 2^256, evaluated as a Horner chain over the bytes. The
/// theoretical resolution (2^-256) is far below an f64 mantissa; the result
/// is simply rounded to the nearest representable double, which keeps it
/// strictly below 1.0.
pub fn digest_to_unit(digest: &[u8; 32]) -> f64 {
    digest
        .iter()
        .rev()
        .fold(0.0, |acc, &byte| (acc + f64::from(byte)) / 256.0)
}
