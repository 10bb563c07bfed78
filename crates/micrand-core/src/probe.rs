//! Device probing: a short throwaway capture that decides usability.

use crate::backend::{AudioBackend, CaptureSpec};
use crate::config::ProbeParams;
use crate::error::RngError;
use crate::variance::has_variance;

/// Probe the device at `index`: open at the fixed format, capture
/// `params.bursts` chunks, close, and validate signal variance.
///
/// Returns why the device is unusable rather than propagating driver
/// errors; callers treat any `Err` as a failed probe.
pub fn probe_device(
    backend: &dyn AudioBackend,
    index: usize,
    params: &ProbeParams,
) -> Result<(), RngError> {
    let spec = CaptureSpec {
        chunk_frames: params.chunk_frames,
        ..CaptureSpec::default()
    };

    let mut stream = backend.open(index, &spec)?;

    let chunk_bytes = spec.chunk_bytes();
    let mut bursts = Vec::with_capacity(params.bursts);
    for _ in 0..params.bursts {
        match stream.read(chunk_bytes) {
            Ok(buf) => bursts.push(buf),
            Err(e) => {
                stream.close();
                return Err(e);
            }
        }
    }
    stream.close();

    if has_variance(&bursts) {
        Ok(())
    } else {
        Err(RngError::VarianceRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CaptureStream;
    use crate::device::Device;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Scripted backend
    // -----------------------------------------------------------------------

    #[derive(Clone, Copy)]
    enum Script {
        /// Every read returns the same byte pattern.
        Constant(u8),
        /// Every read returns fresh, distinct bytes.
        Varying,
        /// open() fails.
        OpenFails,
        /// Reads fail after `usize` successes.
        ReadFailsAfter(usize),
    }

    struct ScriptedBackend {
        script: Script,
        reads: Arc<AtomicUsize>,
    }

    impl ScriptedBackend {
        fn new(script: Script) -> Self {
            Self {
                script,
                reads: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    struct ScriptedStream {
        script: Script,
        reads: Arc<AtomicUsize>,
    }

    impl CaptureStream for ScriptedStream {
        fn read(&mut self, n_bytes: usize) -> Result<Vec<u8>, RngError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Constant(byte) => Ok(vec![byte; n_bytes]),
                Script::Varying => {
                    let mut buf = vec![0u8; n_bytes];
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = (n as u8).wrapping_add(i as u8).wrapping_add(1);
                    }
                    Ok(buf)
                }
                Script::OpenFails => unreachable!(),
                Script::ReadFailsAfter(limit) if n < limit => Ok(vec![n as u8; n_bytes]),
                Script::ReadFailsAfter(_) => {
                    Err(RngError::DeviceReadFailure("scripted".to_string()))
                }
            }
        }

        fn close(&mut self) {}
    }

    impl AudioBackend for ScriptedBackend {
        fn input_devices(&self) -> Result<Vec<Device>, RngError> {
            Ok(Vec::new())
        }

        fn open(
            &self,
            _device_index: usize,
            _spec: &CaptureSpec,
        ) -> Result<Box<dyn CaptureStream>, RngError> {
            if matches!(self.script, Script::OpenFails) {
                return Err(RngError::DeviceOpenFailure("scripted".to_string()));
            }
            Ok(Box::new(ScriptedStream {
                script: self.script,
                reads: Arc::clone(&self.reads),
            }))
        }
    }

    // -----------------------------------------------------------------------
    // Probe behavior
    // -----------------------------------------------------------------------

    #[test]
    fn test_varying_device_passes() {
        let backend = ScriptedBackend::new(Script::Varying);
        assert!(probe_device(&backend, 0, &ProbeParams::default()).is_ok());
    }

    #[test]
    fn test_silent_device_rejected_for_variance() {
        let backend = ScriptedBackend::new(Script::Constant(0));
        assert!(matches!(
            probe_device(&backend, 0, &ProbeParams::default()),
            Err(RngError::VarianceRejected)
        ));
    }

    #[test]
    fn test_constant_device_rejected_for_variance() {
        let backend = ScriptedBackend::new(Script::Constant(0x55));
        assert!(matches!(
            probe_device(&backend, 0, &ProbeParams::default()),
            Err(RngError::VarianceRejected)
        ));
    }

    #[test]
    fn test_open_failure_reported() {
        let backend = ScriptedBackend::new(Script::OpenFails);
        assert!(matches!(
            probe_device(&backend, 3, &ProbeParams::default()),
            Err(RngError::DeviceOpenFailure(_))
        ));
    }

    #[test]
    fn test_read_failure_reported() {
        let backend = ScriptedBackend::new(Script::ReadFailsAfter(1));
        assert!(matches!(
            probe_device(&backend, 0, &ProbeParams::default()),
            Err(RngError::DeviceReadFailure(_))
        ));
    }

    #[test]
    fn test_probe_reads_exactly_burst_count() {
        let backend = ScriptedBackend::new(Script::Varying);
        let params = ProbeParams {
            bursts: 5,
            chunk_frames: 16,
        };
        probe_device(&backend, 0, &params).unwrap();
        assert_eq!(backend.read_count(), 5);
    }
}
