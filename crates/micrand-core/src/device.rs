//! Input device descriptions.

/// An audio input device as reported by the host audio subsystem.
///
/// The index is the device's position in the enumeration order and is only
/// stable for a single session. Devices are discovered, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Position in the catalog's enumeration order.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Number of input channels (always at least 1 for catalog entries).
    pub input_channels: u16,
    /// Default sample rate in Hz.
    pub sample_rate: u32,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({} ch, {} Hz)",
            self.index, self.name, self.input_channels, self.sample_rate
        )
    }
}
