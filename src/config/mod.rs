//! Configuration management for liveq.
//!
//! This module handles loading and validating application configuration from TOML
//! files stored in the user's config directory.

pub mod file;

pub use file::{get_config_path, AudioConfig, LiveqConfig, MAX_FFT_SIZE, MIN_FFT_SIZE};
