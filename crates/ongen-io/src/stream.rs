//! Live output via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};
use ongen_core::OUTPUT_SAMPLE_RATE;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Position in the host's output device list; usable as a selector.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the host's default output.
    pub is_default: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Default channel count.
    pub channels: u16,
}

/// Output stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Buffer size in frames, or the host default when `None`.
    pub buffer_size: Option<u32>,
    /// Output device name or index (uses default if `None`).
    pub output_device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: OUTPUT_SAMPLE_RATE,
            buffer_size: None,
            output_device: None,
        }
    }
}

/// List the host's output devices.
///
/// Devices whose name or default config cannot be read are skipped; a host
/// that cannot enumerate at all yields an empty list.
pub fn list_output_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let mut devices = Vec::new();
    if let Ok(outputs) = host.output_devices() {
        for (index, device) in outputs.enumerate() {
            let Ok(name) = device_name(&device) else {
                continue;
            };
            let Ok(config) = device.default_output_config() else {
                continue;
            };
            devices.push(AudioDevice {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                default_sample_rate: config.sample_rate(),
                channels: config.channels(),
            });
        }
    }
    Ok(devices)
}

/// The host's default output device, if any.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    Ok(list_output_devices()?.into_iter().find(|d| d.is_default))
}

/// Cloneable handle that stops a running [`AudioStream`] from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Stop the stream; [`AudioStream::run_output`] returns shortly after.
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Real-time output stream.
pub struct AudioStream {
    output_device: Device,
    config: StreamConfig,
    running: Arc<AtomicBool>,
    _output_stream: Option<Stream>,
}

impl AudioStream {
    /// Open the configured output device.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let host = cpal::default_host();

        let output_device = match &config.output_device {
            Some(name) => find_output_device(&host, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };
        if let Ok(name) = device_name(&output_device) {
            tracing::info!(device = %name, "opened output device");
        }

        Ok(Self {
            output_device,
            config,
            running: Arc::new(AtomicBool::new(true)),
            _output_stream: None,
        })
    }

    /// Get the configured sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Get the output device channel count.
    pub fn output_channels(&self) -> u16 {
        self.output_device
            .default_output_config()
            .map(|c| c.channels())
            .unwrap_or(2)
    }

    /// Handle for stopping the stream from a signal handler or other thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    /// Run an output-only stream.
    ///
    /// `generate` fills interleaved `f32` frames of
    /// [`output_channels`](Self::output_channels) samples each. Blocks until
    /// [`stop`](Self::stop) is called; returns at once if it already was.
    pub fn run_output<F>(&mut self, mut generate: F) -> Result<()>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let stream_config = cpal::StreamConfig {
            channels: self.output_channels(),
            sample_rate: self.config.sample_rate,
            buffer_size: match self.config.buffer_size {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };

        let output_running = Arc::clone(&self.running);
        let output_stream = self
            .output_device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if output_running.load(Ordering::SeqCst) {
                        generate(data);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| tracing::error!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = stream_config.channels,
            sample_rate = self.config.sample_rate,
            "output stream started"
        );
        self._output_stream = Some(output_stream);

        while self.running.load(Ordering::SeqCst) {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        self._output_stream = None;
        tracing::info!("output stream stopped");
        Ok(())
    }

    /// Stop the audio stream.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the stream is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Copy mono PCM into every channel of interleaved `f32` output.
///
/// Writes `min(src.len(), dst.len() / channels)` frames and returns that
/// count; the rest of `dst` is left as is.
pub fn spread_mono(src: &[i16], dst: &mut [f32], channels: usize) -> usize {
    let channels = channels.max(1);
    let mut frames = 0;
    for (&sample, frame) in src.iter().zip(dst.chunks_exact_mut(channels)) {
        frame.fill(f32::from(sample) / 32768.0);
        frames += 1;
    }
    frames
}

/// Find an output device by index, exact name, or case-insensitive partial name.
fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();

    if let Ok(index) = name_or_index.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "output device index {index} (only {} devices available)",
                devices.len()
            ))
        });
    }

    if let Some(device) = devices
        .iter()
        .find(|d| device_name(d).is_ok_and(|n| n == name_or_index))
    {
        return Ok(device.clone());
    }

    let search = name_or_index.to_lowercase();
    let mut matches: Vec<_> = devices
        .iter()
        .filter_map(|d| {
            device_name(d)
                .ok()
                .filter(|name| name.to_lowercase().contains(&search))
                .map(|name| (d.clone(), name))
        })
        .collect();

    match matches.len() {
        0 => Err(Error::DeviceNotFound(format!(
            "no output device matching '{name_or_index}'"
        ))),
        1 => Ok(matches.remove(0).0),
        _ => {
            let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
            tracing::warn!(
                search = name_or_index,
                ?names,
                "multiple output devices match, using the first"
            );
            Ok(matches.remove(0).0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_output_devices() {
        // Availability depends on the system; enumeration must not fail.
        assert!(list_output_devices().is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert!(config.buffer_size.is_none());
        assert!(config.output_device.is_none());
    }

    #[test]
    fn test_spread_mono_stereo() {
        let mut out = [9.0f32; 6];
        let frames = spread_mono(&[16384, -32768], &mut out, 2);
        assert_eq!(frames, 2);
        assert_eq!(out, [0.5, 0.5, -1.0, -1.0, 9.0, 9.0]);
    }

    #[test]
    fn test_spread_mono_limits() {
        let mut out = [0.0f32; 3];
        assert_eq!(spread_mono(&[1, 2, 3, 4], &mut out, 1), 3);
        let mut out = [0.0f32; 5];
        assert_eq!(spread_mono(&[1, 2, 3], &mut out, 2), 2);
        let mut out = [0.0f32; 2];
        assert_eq!(spread_mono(&[8192, 8192], &mut out, 0), 2);
        assert_eq!(out, [0.25, 0.25]);
    }

    #[test]
    fn test_stop_handle_stops() {
        let running = Arc::new(AtomicBool::new(true));
        let handle = StopHandle(Arc::clone(&running));
        handle.clone().stop();
        assert!(!running.load(Ordering::SeqCst));
    }
}
