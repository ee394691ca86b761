//! Native loopback capture backend (cpal).
//!
//! Preferred backend when a suitable input/loopback device is available on
//! the host. Disabled builds (no `audio-cpal` feature) fall back to the
//! muxer-subprocess backend only.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::device::{select_device, DeviceInfo};
use super::{AudioFrame, CaptureBackend};
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Capture backend driven by a cpal input stream.
pub struct NativeBackend {
    stream: Mutex<Option<cpal::Stream>>,
}

// cpal::Stream holds a platform host-API handle that isn't Send on some
// backends; we only ever touch it from `open`/`close`, both called through
// the same `Arc<dyn CaptureBackend>` dispatch, never concurrently.
unsafe impl Send for NativeBackend {}
unsafe impl Sync for NativeBackend {}

impl NativeBackend {
    /// Creates an unopened native backend.
    pub fn new() -> Self {
        Self {
            stream: Mutex::new(None),
        }
    }

    /// Lists available input devices using the device-selection policy's shape.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let host = cpal::default_host();
        let mut devices = Vec::new();
        if let Ok(inputs) = host.input_devices() {
            for device in inputs {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        id: name.clone(),
                        name,
                        is_input: true,
                    });
                }
            }
        }
        devices
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for NativeBackend {
    fn open(&self, config: &AudioConfig, tx: mpsc::Sender<AudioFrame>) -> Result<(), AudioError> {
        let host = cpal::default_host();
        let devices = Self::list_devices();
        let chosen = select_device(config, &devices)
            .ok_or_else(|| AudioError::Unavailable("no input device found".into()))?;

        let device = host
            .input_devices()
            .map_err(|e| AudioError::Device(e.to_string()))?
            .find(|d| d.name().map(|n| n == chosen.name).unwrap_or(false))
            .ok_or_else(|| AudioError::Device("device disappeared before open".into()))?;

        let stream_config = cpal::StreamConfig {
            channels: config.channels as u16,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.frames_per_buffer),
        };

        let channels = config.channels;
        let sample_rate = config.sample_rate;
        let tx = Arc::new(tx);

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    let frame = AudioFrame {
                        samples: data.to_vec(),
                        channels,
                        sample_rate,
                    };
                    let _ = tx.try_send(frame);
                },
                |err| tracing::warn!(error = %err, "cpal input stream error"),
                None,
            )
            .map_err(|e| AudioError::Device(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Device(e.to_string()))?;

        *self.stream.lock() = Some(stream);
        Ok(())
    }

    fn close(&self) {
        self.stream.lock().take();
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
