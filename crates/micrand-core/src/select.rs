//! Device selection: manual override first, then first-pass-wins auto-scan.

use crate::backend::AudioBackend;
use crate::config::Config;
use crate::probe::probe_device;

/// Pick a usable input device, or `None` for fallback mode.
///
/// A manually configured index is probed first; on failure it logs and falls
/// through to the scan. The scan probes candidates in catalog enumeration
/// order and returns the first that passes — no device is preferred by name
/// or sample rate.
pub fn select_device(backend: &dyn AudioBackend, config: &Config) -> Option<usize> {
    if let Some(index) = config.manual_device_index {
        match probe_device(backend, index, &config.probe) {
            Ok(()) => {
                log::info!("using manually configured input device {index}");
                return Some(index);
            }
            Err(e) => {
                log::warn!("configured device {index} failed its probe ({e}), auto-scanning");
            }
        }
    }

    let devices = match backend.input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("input device enumeration failed: {e}");
            return None;
        }
    };

    for device in &devices {
        match probe_device(backend, device.index, &config.probe) {
            Ok(()) => {
                log::info!("selected input device {device}");
                return Some(device.index);
            }
            Err(e) => log::debug!("device {} rejected: {e}", device.index),
        }
    }

    log::warn!(
        "no input device passed variance probing ({} candidates), using PRNG fallback",
        devices.len()
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CaptureSpec, CaptureStream};
    use crate::device::Device;
    use crate::error::RngError;
    use std::collections::HashMap;

    // -----------------------------------------------------------------------
    // Catalog fixture: per-device behavior keyed by index
    // -----------------------------------------------------------------------

    #[derive(Clone, Copy, PartialEq)]
    enum Signal {
        Silent,
        Constant(u8),
        Varying,
        Broken,
    }

    struct FixtureBackend {
        devices: Vec<Device>,
        signals: HashMap<usize, Signal>,
    }

    impl FixtureBackend {
        fn new(signals: Vec<(usize, Signal)>) -> Self {
            let devices = signals
                .iter()
                .map(|&(index, _)| Device {
                    index,
                    name: format!("fixture {index}"),
                    input_channels: 1,
                    sample_rate: 44_100,
                })
                .collect();
            Self {
                devices,
                signals: signals.into_iter().collect(),
            }
        }
    }

    struct FixtureStream {
        signal: Signal,
        tick: u8,
    }

    impl CaptureStream for FixtureStream {
        fn read(&mut self, n_bytes: usize) -> Result<Vec<u8>, RngError> {
            self.tick = self.tick.wrapping_add(1);
            match self.signal {
                Signal::Silent => Ok(vec![0; n_bytes]),
                Signal::Constant(byte) => Ok(vec![byte; n_bytes]),
                Signal::Varying => Ok(vec![self.tick; n_bytes]),
                Signal::Broken => Err(RngError::DeviceReadFailure("fixture".to_string())),
            }
        }

        fn close(&mut self) {}
    }

    impl AudioBackend for FixtureBackend {
        fn input_devices(&self) -> Result<Vec<Device>, RngError> {
            Ok(self.devices.clone())
        }

        fn open(
            &self,
            device_index: usize,
            _spec: &CaptureSpec,
        ) -> Result<Box<dyn CaptureStream>, RngError> {
            match self.signals.get(&device_index) {
                Some(&signal) => Ok(Box::new(FixtureStream { signal, tick: 0 })),
                None => Err(RngError::DeviceOpenFailure(format!(
                    "no device {device_index}"
                ))),
            }
        }
    }

    fn config_with_override(index: Option<usize>) -> Config {
        Config {
            manual_device_index: index,
            ..Config::default()
        }
    }

    // -----------------------------------------------------------------------
    // Selection order
    // -----------------------------------------------------------------------

    #[test]
    fn test_first_passing_device_wins() {
        // Device 0 silent, device 1 varying, device 2 also varying.
        let backend = FixtureBackend::new(vec![
            (0, Signal::Silent),
            (1, Signal::Varying),
            (2, Signal::Varying),
        ]);
        assert_eq!(select_device(&backend, &Config::default()), Some(1));
    }

    #[test]
    fn test_constant_device_never_selected() {
        let backend = FixtureBackend::new(vec![(0, Signal::Constant(0x42))]);
        assert_eq!(select_device(&backend, &Config::default()), None);
    }

    #[test]
    fn test_empty_catalog_yields_none() {
        let backend = FixtureBackend::new(vec![]);
        assert_eq!(select_device(&backend, &Config::default()), None);
    }

    #[test]
    fn test_broken_device_skipped() {
        let backend = FixtureBackend::new(vec![(0, Signal::Broken), (1, Signal::Varying)]);
        assert_eq!(select_device(&backend, &Config::default()), Some(1));
    }

    // -----------------------------------------------------------------------
    // Manual override
    // -----------------------------------------------------------------------

    #[test]
    fn test_manual_override_wins_when_probe_passes() {
        let backend = FixtureBackend::new(vec![(0, Signal::Varying), (2, Signal::Varying)]);
        assert_eq!(
            select_device(&backend, &config_with_override(Some(2))),
            Some(2)
        );
    }

    #[test]
    fn test_failed_override_falls_through_to_scan() {
        // Override points at the silent device 2; scan should find device 1.
        let backend = FixtureBackend::new(vec![
            (0, Signal::Silent),
            (1, Signal::Varying),
            (2, Signal::Silent),
        ]);
        let selected = select_device(&backend, &config_with_override(Some(2)));
        assert_eq!(selected, Some(1));
        assert_ne!(selected, Some(2));
    }

    #[test]
    fn test_override_for_missing_device_falls_through() {
        let backend = FixtureBackend::new(vec![(0, Signal::Varying)]);
        assert_eq!(
            select_device(&backend, &config_with_override(Some(9))),
            Some(0)
        );
    }
}
