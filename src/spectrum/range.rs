//! Visible frequency window and its direct-edit rules.

use serde::{Deserialize, Serialize};

/// A half-open frequency window `[min_freq, max_freq)` in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub min_freq: f64,
    pub max_freq: f64,
}

impl FrequencyRange {
    pub const fn new(min_freq: f64, max_freq: f64) -> Self {
        Self { min_freq, max_freq }
    }

    /// Width of the window in Hz. Negative when the window is inverted.
    pub fn span(&self) -> f64 {
        self.max_freq - self.min_freq
    }

    /// Restricts the window to the representable band `[0, nyquist]`.
    ///
    /// The result may be empty or inverted; callers check [`Self::is_valid`].
    pub fn clamp_to(&self, nyquist: f64) -> Self {
        Self {
            min_freq: self.min_freq.max(0.0),
            max_freq: self.max_freq.min(nyquist),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min_freq < self.max_freq
    }
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self::new(20.0, 3000.0)
    }
}

impl std::fmt::Display for FrequencyRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{} Hz",
            self.min_freq.round(),
            self.max_freq.round()
        )
    }
}

/// Single source of truth for the visible window.
///
/// Mutated by committed zoom results and by direct numeric edits. The renderer
/// only ever reads it.
#[derive(Debug, Clone)]
pub struct RangeState {
    current: FrequencyRange,
    initial: FrequencyRange,
}

impl RangeState {
    pub fn new(initial: FrequencyRange) -> Self {
        Self {
            current: initial,
            initial,
        }
    }

    pub fn get(&self) -> FrequencyRange {
        self.current
    }

    /// Applies a range computed by the zoom controller.
    pub fn commit(&mut self, range: FrequencyRange) {
        tracing::debug!("Range committed: {}", range);
        self.current = range;
    }

    /// Direct edit of the lower bound.
    ///
    /// Accepted only when strictly below the current maximum; negative values
    /// are stored as 0. Returns whether the state changed; rejected edits
    /// leave the prior range untouched.
    pub fn edit_min(&mut self, value: f64) -> bool {
        if !value.is_finite() || value >= self.current.max_freq {
            tracing::debug!("Rejected min edit: {}", value);
            return false;
        }
        self.current.min_freq = value.max(0.0);
        true
    }

    /// Direct edit of the upper bound.
    ///
    /// Accepted only when strictly above the current minimum; the stored value
    /// is clamped to `nyquist`.
    pub fn edit_max(&mut self, value: f64, nyquist: f64) -> bool {
        if !value.is_finite() || value <= self.current.min_freq {
            tracing::debug!("Rejected max edit: {}", value);
            return false;
        }
        self.current.max_freq = value.min(nyquist);
        true
    }

    /// Restores the window the session started with.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for RangeState {
    fn default() -> Self {
        Self::new(FrequencyRange::default())
    }
}
