//! WAV file playback as a real-time spectrum source.
//!
//! The decoded file is treated as an endless loop; the analysis window ends at
//! the playback cursor derived from wall-clock time since the source opened.

use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::{Duration, Instant};

use super::{ByteAnalyser, LiveFrame, SpectrumSource};

pub struct WavFileSource {
    /// Mono samples in `-1.0..=1.0`
    samples: Vec<f32>,
    sample_rate: u32,
    started: Instant,
    analyser: ByteAnalyser,
    scratch: Vec<f32>,
    ready: bool,
}

impl WavFileSource {
    /// Decodes `path` and prepares looping playback.
    ///
    /// # Errors
    /// - If the file cannot be opened or is not a valid WAV file
    /// - If the file contains no samples
    pub fn open(path: &Path, analyser: ByteAnalyser) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| anyhow!("Failed to open {}: {e}", path.display()))?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let samples: Vec<f32> = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        if samples.is_empty() {
            return Err(anyhow!("{} contains no audio", path.display()));
        }

        tracing::info!(
            "Loaded {}: {:.2}s at {}Hz, {} channels",
            path.display(),
            samples.len() as f32 / spec.sample_rate as f32,
            spec.sample_rate,
            channels
        );

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            started: Instant::now(),
            scratch: Vec::with_capacity(analyser.fft_size()),
            analyser,
            ready: false,
        })
    }

    /// Playback position for a given elapsed time, wrapping at the end.
    fn cursor_at(&self, elapsed: Duration) -> usize {
        let position = (elapsed.as_secs_f64() * f64::from(self.sample_rate)) as usize;
        position % self.samples.len()
    }

    /// Analyses the window ending at the cursor for `elapsed`.
    fn analyse_at(&mut self, elapsed: Duration) {
        let end = self.cursor_at(elapsed);
        window_ending_at(&self.samples, end, self.analyser.fft_size(), &mut self.scratch);
        self.analyser.analyse(&self.scratch);
        self.ready = true;
    }
}

impl SpectrumSource for WavFileSource {
    fn sample_rate(&self) -> Option<f64> {
        Some(f64::from(self.sample_rate))
    }

    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn refresh(&mut self) {
        self.analyse_at(self.started.elapsed());
    }

    fn frame(&self) -> Option<LiveFrame<'_>> {
        self.ready.then(|| LiveFrame {
            bins: self.analyser.bins(),
            sample_rate: f64::from(self.sample_rate),
        })
    }
}

/// Copies the `len` samples preceding `end` into `out`, looping over `samples`.
fn window_ending_at(samples: &[f32], end: usize, len: usize, out: &mut Vec<f32>) {
    out.clear();
    let total = samples.len();
    let len = len.min(total);
    let start = (end + total - len) % total;
    out.extend((0..len).map(|i| samples[(start + i) % total]));
}
