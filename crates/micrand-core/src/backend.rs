//! Audio subsystem seam: device catalog and capture streams.
//!
//! Everything above this module talks to the hardware through the
//! [`AudioBackend`] and [`CaptureStream`] traits, so probing, selection and
//! extraction are all testable without a microphone. [`CpalBackend`] is the
//! production implementation over cpal.
//!
//! cpal delivers samples on a callback thread and its `Stream` handle is not
//! `Send`, so the open stream lives on a dedicated capture thread that
//! forwards 16-bit little-endian sample bytes over a channel. The handle
//! returned from [`AudioBackend::open`] only owns the receiving side plus a
//! stop flag, which keeps it `Send` and lets the manager hold it behind a
//! mutex.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig};

use crate::device::Device;
use crate::error::RngError;
use crate::silence::StderrSilencer;

/// Fixed capture format for probing and extraction: mono 16-bit PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSpec {
    /// Channel count.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per chunk delivered to probe reads.
    pub chunk_frames: usize,
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44_100,
            chunk_frames: 1024,
        }
    }
}

impl CaptureSpec {
    /// Bytes in one chunk (16-bit samples).
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_frames * self.channels as usize * 2
    }
}

/// An open capture session. At most one exists at any instant; the manager's
/// lock enforces that.
pub trait CaptureStream: Send {
    /// Read exactly `n_bytes` of raw sample data from the stream.
    fn read(&mut self, n_bytes: usize) -> Result<Vec<u8>, RngError>;

    /// Release the underlying device. Idempotent; also runs on drop.
    fn close(&mut self);
}

/// Host audio subsystem: enumeration plus stream opening.
pub trait AudioBackend: Send + Sync {
    /// All capture-capable devices, in enumeration order.
    fn input_devices(&self) -> Result<Vec<Device>, RngError>;

    /// Open a capture stream on the device at `device_index`.
    fn open(
        &self,
        device_index: usize,
        spec: &CaptureSpec,
    ) -> Result<Box<dyn CaptureStream>, RngError>;
}

// ---------------------------------------------------------------------------
// cpal implementation
// ---------------------------------------------------------------------------

/// How long to wait for the capture thread to confirm the stream is live.
const OPEN_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadline for a single `read` call before it counts as a device failure.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Bounded queue of sample chunks between the callback and the reader.
const CHUNK_QUEUE_DEPTH: usize = 32;

/// Production backend over the host audio subsystem.
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }

    fn device_at(index: usize) -> Result<cpal::Device, RngError> {
        let host = cpal::default_host();
        let mut devices = host
            .input_devices()
            .map_err(|e| RngError::DeviceOpenFailure(e.to_string()))?;
        devices.nth(index).ok_or(RngError::NoDeviceFound)
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn input_devices(&self) -> Result<Vec<Device>, RngError> {
        // ALSA chatters on fd 2 during enumeration.
        let _quiet = StderrSilencer::activate();

        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| RngError::DeviceOpenFailure(e.to_string()))?;

        let mut catalog = Vec::new();
        for (index, device) in devices.enumerate() {
            let name = device
                .name()
                .unwrap_or_else(|_| format!("input device {index}"));
            // Indices must stay aligned with enumeration order, so devices
            // that cannot report an input config are skipped, not renumbered.
            let Ok(config) = device.default_input_config() else {
                continue;
            };
            if config.channels() == 0 {
                continue;
            }
            catalog.push(Device {
                index,
                name,
                input_channels: config.channels(),
                sample_rate: config.sample_rate().0,
            });
        }
        Ok(catalog)
    }

    fn open(
        &self,
        device_index: usize,
        spec: &CaptureSpec,
    ) -> Result<Box<dyn CaptureStream>, RngError> {
        let _quiet = StderrSilencer::activate();

        let device = Self::device_at(device_index)?;
        let format = device
            .default_input_config()
            .map_err(|e| RngError::DeviceOpenFailure(e.to_string()))?
            .sample_format();

        let config = StreamConfig {
            channels: spec.channels,
            sample_rate: SampleRate(spec.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let (chunk_tx, chunk_rx) = mpsc::sync_channel::<Vec<u8>>(CHUNK_QUEUE_DEPTH);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), RngError>>();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let join = std::thread::Builder::new()
            .name("micrand-capture".to_string())
            .spawn(move || capture_thread(device, config, format, chunk_tx, ready_tx, thread_stop))
            .map_err(|e| RngError::DeviceOpenFailure(e.to_string()))?;

        let mut stream = CpalStream {
            chunks: chunk_rx,
            pending: Vec::new(),
            stop,
            join: Some(join),
        };

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => Ok(Box::new(stream)),
            Ok(Err(e)) => {
                stream.close();
                Err(e)
            }
            Err(_) => {
                stream.close();
                Err(RngError::DeviceOpenFailure(
                    "capture thread did not start in time".to_string(),
                ))
            }
        }
    }
}

/// Owns the cpal stream for its whole lifetime; signals readiness once the
/// stream is playing and then parks until told to stop.
fn capture_thread(
    device: cpal::Device,
    config: StreamConfig,
    format: SampleFormat,
    chunk_tx: SyncSender<Vec<u8>>,
    ready_tx: mpsc::Sender<Result<(), RngError>>,
    stop: Arc<AtomicBool>,
) {
    let err_fn = |err| log::debug!("capture stream error: {err}");

    let built = match format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let mut bytes = Vec::with_capacity(data.len() * 2);
                for sample in data {
                    bytes.extend_from_slice(&sample.to_le_bytes());
                }
                // Drop the chunk if the reader is behind; never block the
                // audio callback.
                let _ = chunk_tx.try_send(bytes);
            },
            err_fn,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut bytes = Vec::with_capacity(data.len() * 2);
                for sample in data {
                    let scaled = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
                    bytes.extend_from_slice(&scaled.to_le_bytes());
                }
                let _ = chunk_tx.try_send(bytes);
            },
            err_fn,
            None,
        ),
        other => {
            let _ = ready_tx.send(Err(RngError::UnsupportedFormat(format!("{other:?}"))));
            return;
        }
    };

    let stream = match built {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(RngError::DeviceOpenFailure(e.to_string())));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(RngError::DeviceOpenFailure(e.to_string())));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(10));
    }
    drop(stream);
}

/// `Send` handle to the capture thread.
struct CpalStream {
    chunks: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl CaptureStream for CpalStream {
    fn read(&mut self, n_bytes: usize) -> Result<Vec<u8>, RngError> {
        let deadline = Instant::now() + READ_TIMEOUT;
        while self.pending.len() < n_bytes {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RngError::DeviceReadFailure(
                    "timed out waiting for samples".to_string(),
                ));
            }
            match self.chunks.recv_timeout(remaining) {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(RngError::DeviceReadFailure(
                        "timed out waiting for samples".to_string(),
                    ));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RngError::DeviceReadFailure(
                        "capture thread exited".to_string(),
                    ));
                }
            }
        }
        Ok(self.pending.drain(..n_bytes).collect())
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        self.pending.clear();
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.close();
    }
}
