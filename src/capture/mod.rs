//! Spectrum sources: audio acquisition plus frequency analysis.
//!
//! A source owns its magnitude buffer and overwrites it in place on every
//! [`SpectrumSource::refresh`]. Consumers only get a borrowed [`LiveFrame`]
//! and must copy anything they want to keep past the current tick.

pub mod analyser;
pub mod audio;
pub mod file;

use std::path::Path;

pub use analyser::ByteAnalyser;
pub use audio::MicrophoneSource;
pub use file::WavFileSource;

use crate::config::AudioConfig;

/// Borrowed view of the latest magnitude frame.
#[derive(Debug, Clone, Copy)]
pub struct LiveFrame<'a> {
    /// One magnitude per bin, `0..=255`; bin `i` sits at `i / len * nyquist`.
    pub bins: &'a [u8],
    pub sample_rate: f64,
}

impl LiveFrame<'_> {
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }
}

/// Pull-based producer of magnitude frames.
pub trait SpectrumSource {
    /// Sampling rate in Hz, or `None` while the source is not ready.
    fn sample_rate(&self) -> Option<f64>;

    /// Number of bins in every frame.
    fn bin_count(&self) -> usize;

    /// Analyses the most recent audio into the source-owned frame buffer.
    fn refresh(&mut self);

    /// The frame produced by the last refresh, or `None` while not ready.
    fn frame(&self) -> Option<LiveFrame<'_>>;
}

/// Opens the WAV file when one is given, otherwise the configured input device.
///
/// # Errors
/// - If the file cannot be decoded
/// - If the input device cannot be opened or started
pub fn open_source(
    audio: &AudioConfig,
    device_override: Option<&str>,
    file: Option<&Path>,
) -> anyhow::Result<Box<dyn SpectrumSource>> {
    let analyser = ByteAnalyser::new(
        audio.fft_size,
        audio.smoothing,
        audio.min_decibels,
        audio.max_decibels,
    );

    if let Some(path) = file {
        tracing::info!("Analysing file: {}", path.display());
        return Ok(Box::new(WavFileSource::open(path, analyser)?));
    }

    let device = device_override.unwrap_or(&audio.device).to_string();
    let mut source = MicrophoneSource::new(device, analyser);
    source.start()?;
    Ok(Box::new(source))
}
