//! Configuration file management for liveq.
//!
//! This module handles loading and validating application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::spectrum::{RenderConfig, ZoomConfig};

/// Smallest accepted `audio.fft_size`.
pub const MIN_FFT_SIZE: usize = 32;
/// Largest accepted `audio.fft_size`.
pub const MAX_FFT_SIZE: usize = 32768;

/// Audio capture and analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `liveq list-devices`
    /// - device name from `liveq list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Analysis window length in samples (power of two); bins = fft_size / 2
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Time smoothing between frames (0.0 = none, close to 1.0 = very slow)
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Level in dBFS shown as an empty bar
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f64,
    /// Level in dBFS shown as a full-height bar
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f64,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_fft_size() -> usize {
    8192
}

fn default_smoothing() -> f64 {
    0.8
}

fn default_min_decibels() -> f64 {
    -100.0
}

fn default_max_decibels() -> f64 {
    -30.0
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveqConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub display: RenderConfig,
    #[serde(default)]
    pub zoom: ZoomConfig,
}

impl LiveqConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed or fails validation
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)
            .map_err(|e| anyhow!("Failed to read {}: {e}", config_path.display()))?;
        Self::from_toml(&config_content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    /// - If the TOML is malformed
    /// - If a value is out of its usable range
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: LiveqConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let fft_size = self.audio.fft_size;
        if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(anyhow!(
                "audio.fft_size ({fft_size}) must be a power of two between {MIN_FFT_SIZE} and {MAX_FFT_SIZE}"
            ));
        }
        if self.audio.max_decibels <= self.audio.min_decibels {
            return Err(anyhow!(
                "audio.max_decibels ({}) must be greater than audio.min_decibels ({})",
                self.audio.max_decibels,
                self.audio.min_decibels
            ));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(anyhow!("display.width and display.height must be non-zero"));
        }
        if self.display.bottom_padding >= f64::from(self.display.height) {
            return Err(anyhow!(
                "display.bottom_padding must be smaller than display.height"
            ));
        }
        if self.zoom.factor <= 1.0 {
            return Err(anyhow!("zoom.factor must be greater than 1.0"));
        }
        if self.zoom.min_span <= 0.0 {
            return Err(anyhow!("zoom.min_span must be positive"));
        }
        Ok(())
    }
}

/// Retrieves the path to the config file, creating its directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("liveq");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("liveq.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = LiveqConfig::from_toml("").unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.fft_size, 8192);
        assert_eq!(config.display.width, 800);
        assert_eq!(config.display.label_count, 6);
        assert_eq!(config.zoom.throttle_ms, 100);
        assert_eq!(config.zoom.factor, 1.15);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = LiveqConfig::from_toml(
            r#"
            [audio]
            device = "2"

            [zoom]
            throttle_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.device, "2");
        assert_eq!(config.audio.smoothing, 0.8);
        assert_eq!(config.zoom.throttle_ms, 50);
        assert_eq!(config.zoom.min_span, 10.0);
        assert_eq!(config.display.min_freq, 20.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(LiveqConfig::from_toml("[zoom]\nfactor = 1.0").is_err());
        assert!(LiveqConfig::from_toml("[audio]\nmin_decibels = -20.0\nmax_decibels = -30.0").is_err());
        assert!(LiveqConfig::from_toml("[display]\nheight = 10\nbottom_padding = 20.0").is_err());
    }

    #[test]
    fn test_fft_size_must_be_bounded_power_of_two() {
        assert!(LiveqConfig::from_toml("[audio]\nfft_size = 1000").is_err());
        assert!(LiveqConfig::from_toml("[audio]\nfft_size = 16").is_err());
        assert!(LiveqConfig::from_toml("[audio]\nfft_size = 0").is_err());
        assert!(LiveqConfig::from_toml("[audio]\nfft_size = 65536").is_err());
        assert!(LiveqConfig::from_toml("[audio]\nfft_size = 2147483648").is_err());
        assert!(LiveqConfig::from_toml("[audio]\nfft_size = 9223372036854775807").is_err());

        assert_eq!(
            LiveqConfig::from_toml("[audio]\nfft_size = 32").unwrap().audio.fft_size,
            MIN_FFT_SIZE
        );
        assert_eq!(
            LiveqConfig::from_toml("[audio]\nfft_size = 32768").unwrap().audio.fft_size,
            MAX_FFT_SIZE
        );
    }

    #[test]
    fn test_default_template_parses() {
        let config = LiveqConfig::from_toml(crate::setup::DEFAULT_CONFIG).unwrap();
        assert_eq!(config.display.max_freq, 3000.0);
    }
}
