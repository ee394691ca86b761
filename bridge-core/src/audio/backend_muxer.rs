//! External muxer subprocess capture backend.
//!
//! Spawns an ffmpeg-like process configured with a format string and one or
//! more input device strings, reading interleaved float32le samples from its
//! standard output. Used when no native loopback driver is available, or
//! when multiple inputs need to be pre-mixed before reaching the extractor.

use std::process::Stdio;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use super::{AudioFrame, CaptureBackend};
use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::runtime::TaskSpawner;

/// Capture backend that shells out to a muxer subprocess.
pub struct MuxerBackend {
    spawner: Arc<dyn TaskSpawner>,
    child: Mutex<Option<Child>>,
}

impl MuxerBackend {
    /// Creates a muxer backend that spawns tasks via `spawner`.
    pub fn new(spawner: Arc<dyn TaskSpawner>) -> Self {
        Self {
            spawner,
            child: Mutex::new(None),
        }
    }
}

impl CaptureBackend for MuxerBackend {
    fn open(&self, config: &AudioConfig, tx: mpsc::Sender<AudioFrame>) -> Result<(), AudioError> {
        let path = config
            .muxer_path
            .as_ref()
            .ok_or_else(|| AudioError::Unavailable("no muxer_path configured".into()))?;
        if config.muxer_inputs.is_empty() {
            return Err(AudioError::Unavailable("no muxer_inputs configured".into()));
        }

        let mut cmd = Command::new(path);
        if let Some(fmt) = &config.muxer_format {
            cmd.arg("-f").arg(fmt);
        }
        for input in &config.muxer_inputs {
            cmd.arg("-i").arg(input);
        }
        cmd.arg("-f")
            .arg("f32le")
            .arg("-ar")
            .arg(config.sample_rate.to_string())
            .arg("-ac")
            .arg(config.channels.to_string())
            .arg("pipe:1")
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd
            .spawn()
            .map_err(|e| AudioError::SubprocessExited(format!("failed to spawn muxer: {e}")))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| AudioError::SubprocessExited("muxer has no stdout".into()))?;

        *self.child.lock() = Some(child);

        let channels = config.channels;
        let sample_rate = config.sample_rate;
        let bytes_per_sample = std::mem::size_of::<f32>();
        let frame_bytes = bytes_per_sample * channels as usize;

        self.spawner.spawn(async move {
            let mut carry: Vec<u8> = Vec::new();
            let mut buf = vec![0u8; 8192];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => {
                        tracing::info!("muxer subprocess closed stdout");
                        break;
                    }
                    Ok(n) => {
                        carry.extend_from_slice(&buf[..n]);
                        let usable = carry.len() - (carry.len() % frame_bytes);
                        if usable == 0 {
                            continue;
                        }
                        let samples: Vec<f32> = carry[..usable]
                            .chunks_exact(bytes_per_sample)
                            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                            .collect();
                        carry.drain(..usable);

                        let frame = AudioFrame {
                            samples,
                            channels,
                            sample_rate,
                        };
                        if tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "muxer read error");
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    fn close(&self) {
        if let Some(mut child) = self.child.lock().take() {
            let _ = child.start_kill();
        }
    }

    fn name(&self) -> &'static str {
        "muxer"
    }
}
