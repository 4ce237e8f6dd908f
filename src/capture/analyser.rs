//! Frequency analysis producing byte magnitude frames.
//!
//! Windowing, FFT and dB scaling follow the usual "byte frequency data"
//! contract: Blackman window over the most recent `fft_size` samples,
//! magnitudes normalised by `fft_size`, exponential smoothing between frames,
//! then `[min_decibels, max_decibels]` mapped linearly onto `0..=255`.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::config::{MAX_FFT_SIZE, MIN_FFT_SIZE};

/// Stateful analyser with a reusable FFT plan and smoothing memory.
pub struct ByteAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bins: Vec<u8>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
}

impl ByteAnalyser {
    /// Creates an analyser producing `fft_size / 2` bins.
    ///
    /// `fft_size` is clamped to the configurable range and rounded up to a
    /// power of two.
    pub fn new(fft_size: usize, smoothing: f64, min_decibels: f64, max_decibels: f64) -> Self {
        let fft_size = fft_size
            .clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
            .next_power_of_two();
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        let window = (0..fft_size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / fft_size as f32;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            })
            .collect();

        let bin_count = fft_size / 2;
        Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bin_count],
            bins: vec![0; bin_count],
            smoothing: smoothing.clamp(0.0, 1.0) as f32,
            min_decibels: min_decibels as f32,
            max_decibels: max_decibels as f32,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Analyses the tail of `samples` into the frame buffer.
    ///
    /// Fewer samples than `fft_size` are zero-padded at the front.
    pub fn analyse(&mut self, samples: &[f32]) {
        let fft_size = self.fft_size();
        let recent = &samples[samples.len().saturating_sub(fft_size)..];
        let offset = fft_size - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < offset { 0.0 } else { recent[i - offset] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let scale = 1.0 / fft_size as f32;
        let db_range = self.max_decibels - self.min_decibels;
        for (k, (smoothed, byte)) in self.smoothed.iter_mut().zip(&mut self.bins).enumerate() {
            let magnitude = self.buffer[k].norm() * scale;
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;

            *byte = if *smoothed > 0.0 && db_range > 0.0 {
                let db = 20.0 * smoothed.log10();
                ((db - self.min_decibels) / db_range * 255.0).clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }

    /// The latest frame.
    pub fn bins(&self) -> &[u8] {
        &self.bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_bin_count_is_half_fft_size() {
        let analyser = ByteAnalyser::new(8192, 0.8, -100.0, -30.0);
        assert_eq!(analyser.bin_count(), 4096);
        assert_eq!(analyser.fft_size(), 8192);
    }

    #[test]
    fn test_fft_size_is_clamped_and_rounded() {
        assert_eq!(ByteAnalyser::new(0, 0.8, -100.0, -30.0).fft_size(), MIN_FFT_SIZE);
        assert_eq!(ByteAnalyser::new(1000, 0.8, -100.0, -30.0).fft_size(), 1024);
        assert_eq!(
            ByteAnalyser::new(usize::MAX, 0.8, -100.0, -30.0).fft_size(),
            MAX_FFT_SIZE
        );
    }

    #[test]
    fn test_silence_produces_zero_frame() {
        let mut analyser = ByteAnalyser::new(1024, 0.8, -100.0, -30.0);
        analyser.analyse(&vec![0.0; 1024]);
        assert!(analyser.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut analyser = ByteAnalyser::new(1024, 0.0, -100.0, -30.0);
        // 3000 Hz sits exactly on bin 64 at 48 kHz / 1024.
        analyser.analyse(&sine(3000.0, 48000.0, 0.1, 1024));

        let bins = analyser.bins();
        let peak = bins
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 64);
        assert!(bins[300] < bins[64] / 2);
    }

    #[test]
    fn test_smoothing_carries_energy_between_frames() {
        let mut analyser = ByteAnalyser::new(1024, 0.8, -100.0, -30.0);
        analyser.analyse(&sine(3000.0, 48000.0, 0.5, 1024));
        let loud = analyser.bins()[64];

        analyser.analyse(&vec![0.0; 1024]);
        let decayed = analyser.bins()[64];

        assert!(decayed > 0);
        assert!(decayed < loud);
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let mut analyser = ByteAnalyser::new(1024, 0.0, -100.0, -30.0);
        analyser.analyse(&sine(3000.0, 48000.0, 0.5, 100));
        assert!(analyser.bins().iter().any(|&b| b > 0));
    }
}
