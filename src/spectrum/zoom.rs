//! Pointer-anchored wheel zoom with a coalescing commit throttle.
//!
//! Every wheel event is turned into a candidate range immediately, but the
//! shared range state is only mutated when the throttle fires, at most once
//! per `throttle_ms`, with whatever candidate was computed last.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::range::FrequencyRange;
use super::throttle::{Clock, SystemClock, Throttle};

/// Zoom behaviour settings (`[zoom]` in the config file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Span is divided by this per zoom-in tick and multiplied per zoom-out tick.
    pub factor: f64,
    /// Narrowest allowed window in Hz.
    pub min_span: f64,
    /// Minimum time between two range commits, in milliseconds.
    pub throttle_ms: u64,
    /// Nyquist frequency assumed while the spectrum source is not ready.
    pub fallback_nyquist: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            factor: 1.15,
            min_span: 10.0,
            throttle_ms: 100,
            fallback_nyquist: 22050.0,
        }
    }
}

/// One raw wheel event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomGesture {
    /// Horizontal pointer position in logical canvas pixels.
    pub pointer_x: f64,
    /// Logical canvas width in pixels.
    pub canvas_width: f64,
    /// Wheel delta; negative zooms in.
    pub delta: f64,
    /// Whether the zoom modifier was held.
    pub modifier_held: bool,
}

/// Whether a gesture was consumed by the zoom controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Not a zoom gesture; the event should keep its default handling.
    Ignored,
    Consumed,
}

/// Computes the range one zoom tick away from `current`.
///
/// The frequency under the pointer keeps its relative screen position.
/// Returns `None` when the clamped current range is empty or the gesture
/// carries no direction.
pub fn zoom_range(
    current: FrequencyRange,
    gesture: &ZoomGesture,
    nyquist: f64,
    config: &ZoomConfig,
) -> Option<FrequencyRange> {
    let clamped = current.clamp_to(nyquist);
    let span = clamped.span();
    if span <= 0.0 || gesture.delta == 0.0 || !gesture.delta.is_finite() {
        return None;
    }

    let ratio = if gesture.canvas_width > 0.0 {
        (gesture.pointer_x / gesture.canvas_width).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let freq_at_pointer = clamped.min_freq + ratio * span;

    let new_span = if gesture.delta < 0.0 {
        span / config.factor
    } else {
        (span * config.factor).min(nyquist)
    }
    .max(config.min_span);

    let new_min = freq_at_pointer - (freq_at_pointer - clamped.min_freq) * (new_span / span);
    let new_max = new_min + new_span;

    let min_freq = new_min.max(0.0);
    let mut max_freq = new_max.min(nyquist);
    if max_freq <= min_freq {
        max_freq = min_freq + config.min_span;
    }
    max_freq = max_freq.min(nyquist);

    Some(FrequencyRange::new(min_freq, max_freq))
}

/// Turns wheel gestures into throttled range commits.
pub struct ZoomController<C: Clock = SystemClock> {
    config: ZoomConfig,
    clock: C,
    throttle: Throttle<FrequencyRange>,
    torn_down: bool,
}

impl ZoomController<SystemClock> {
    pub fn new(config: ZoomConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ZoomController<C> {
    pub fn with_clock(config: ZoomConfig, clock: C) -> Self {
        let delay = Duration::from_millis(config.throttle_ms);
        Self {
            config,
            clock,
            throttle: Throttle::new(delay),
            torn_down: false,
        }
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    /// Handles one wheel event against the committed range.
    ///
    /// `nyquist` is `None` while the source is not ready, in which case the
    /// configured fallback is used.
    pub fn on_gesture(
        &mut self,
        gesture: &ZoomGesture,
        current: FrequencyRange,
        nyquist: Option<f64>,
    ) -> GestureOutcome {
        if !gesture.modifier_held || self.torn_down {
            return GestureOutcome::Ignored;
        }

        let nyquist = nyquist.unwrap_or(self.config.fallback_nyquist);
        if let Some(next) = zoom_range(current, gesture, nyquist, &self.config) {
            if self.throttle.offer(next, self.clock.now()) {
                tracing::trace!("Zoom commit scheduled in {}ms", self.config.throttle_ms);
            }
        }

        GestureOutcome::Consumed
    }

    /// Returns the range to commit if the scheduled apply-action is due.
    pub fn poll_commit(&mut self) -> Option<FrequencyRange> {
        if self.torn_down {
            return None;
        }
        self.throttle.take_due(self.clock.now())
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        self.throttle.is_scheduled()
    }

    /// Cancels any scheduled commit. Later gestures and polls are no-ops.
    pub fn teardown(&mut self) {
        if self.throttle.is_scheduled() {
            tracing::debug!("Discarding pending zoom commit on teardown");
        }
        self.throttle.cancel();
        self.torn_down = true;
    }
}
