//! Live input device capture.
//!
//! Captures from the configured input device at its native sample rate,
//! downmixes to mono and keeps only the most recent `fft_size` samples for
//! the analyser.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::{ByteAnalyser, LiveFrame, SpectrumSource};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Bounded FIFO of the most recent mono samples.
#[derive(Debug)]
pub struct SampleRing {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Appends interleaved frames averaged down to mono.
    pub fn push_interleaved<T>(&mut self, data: &[T], channels: usize)
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = channels.max(1);
        for frame in data.chunks_exact(channels) {
            let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
            self.push(sum / channels as f32);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copies the buffered samples, oldest first, into `out`.
    pub fn copy_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.samples.iter().copied());
    }
}

/// Spectrum source fed by an input device.
///
/// Not ready until the stream has delivered its first samples.
pub struct MicrophoneSource {
    /// Device name, numeric index or "default"
    device_name: String,
    /// Actual sample rate from the device, known once started
    sample_rate: Option<u32>,
    ring: Arc<Mutex<SampleRing>>,
    /// Active input stream (kept alive while capturing)
    stream: Option<cpal::Stream>,
    analyser: ByteAnalyser,
    scratch: Vec<f32>,
    ready: bool,
}

impl MicrophoneSource {
    pub fn new(device_name: String, analyser: ByteAnalyser) -> Self {
        let capacity = analyser.fft_size();
        Self {
            device_name,
            sample_rate: None,
            ring: Arc::new(Mutex::new(SampleRing::new(capacity))),
            stream: None,
            analyser,
            scratch: Vec::with_capacity(capacity),
            ready: false,
        }
    }

    /// Opens the device and starts streaming into the sample ring.
    ///
    /// # Errors
    /// - If the specified device is not available
    /// - If the device reports an unsupported sample format
    /// - If audio stream creation fails
    pub fn start(&mut self) -> Result<()> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;
        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            sample_rate,
            channels,
            device_config.sample_format()
        );

        let stream_config = device_config.config();
        let stream = match device_config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, &self.ring, channels)
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, &self.ring, channels)
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &stream_config, &self.ring, channels)
            }
            other => Err(anyhow!("Unsupported sample format: {other:?}")),
        }?;

        stream.play()?;
        self.stream = Some(stream);
        self.sample_rate = Some(sample_rate);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    /// Stops the stream. The source reports not-ready afterwards.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Audio stream stopped");
        }
        self.ready = false;
    }
}

impl SpectrumSource for MicrophoneSource {
    fn sample_rate(&self) -> Option<f64> {
        self.sample_rate.map(f64::from)
    }

    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn refresh(&mut self) {
        if self.stream.is_none() {
            return;
        }
        {
            let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
            if ring.is_empty() {
                return;
            }
            ring.copy_into(&mut self.scratch);
        }
        self.analyser.analyse(&self.scratch);
        self.ready = true;
    }

    fn frame(&self) -> Option<LiveFrame<'_>> {
        if !self.ready {
            return None;
        }
        Some(LiveFrame {
            bins: self.analyser.bins(),
            sample_rate: f64::from(self.sample_rate?),
        })
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: &Arc<Mutex<SampleRing>>,
    channels: usize,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let ring = Arc::clone(ring);
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            ring.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_interleaved(data, channels);
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();
        let count = devices.len();

        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'liveq list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
