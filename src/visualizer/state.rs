//! The visualizer instance: owns the visible range, the saved frame and the
//! zoom controller, and drives one render pass per tick.
//!
//! All mutation happens on the caller's thread. A due zoom commit is applied
//! at the top of [`Visualizer::tick`], so a render pass always sees a single
//! `(live, saved, range)` snapshot.

use crate::capture::SpectrumSource;
use crate::spectrum::{
    render_frame, render_waiting, Clock, FrequencyRange, GestureOutcome, RangeState,
    RenderConfig, RenderOutcome, SavedFrame, Surface, SystemClock, ZoomConfig, ZoomController,
    ZoomGesture,
};

pub struct Visualizer<C: Clock = SystemClock> {
    range: RangeState,
    saved: SavedFrame,
    zoom: ZoomController<C>,
    render: RenderConfig,
    live: bool,
    /// Nyquist frequency seen on the last ready tick.
    nyquist: Option<f64>,
}

impl Visualizer<SystemClock> {
    pub fn new(render: RenderConfig, zoom: ZoomConfig) -> Self {
        Self::with_clock(render, zoom, SystemClock)
    }
}

impl<C: Clock> Visualizer<C> {
    pub fn with_clock(render: RenderConfig, zoom: ZoomConfig, clock: C) -> Self {
        Self {
            range: RangeState::new(render.default_range()),
            saved: SavedFrame::new(),
            zoom: ZoomController::with_clock(zoom, clock),
            render,
            live: true,
            nyquist: None,
        }
    }

    /// Runs one render pass.
    ///
    /// Returns `None` once the visualizer has been torn down; nothing is drawn
    /// in that case.
    pub fn tick<S: Surface + ?Sized>(
        &mut self,
        source: &mut dyn SpectrumSource,
        surface: &mut S,
    ) -> Option<RenderOutcome> {
        if !self.live {
            return None;
        }

        if let Some(next) = self.zoom.poll_commit() {
            self.range.commit(next);
        }

        source.refresh();
        let outcome = match source.frame() {
            Some(frame) => {
                self.observe_nyquist(frame.nyquist());
                render_frame(
                    surface,
                    frame.bins,
                    self.saved.get(),
                    self.range.get(),
                    frame.sample_rate,
                    &self.render,
                )
            }
            None => render_waiting(surface),
        };

        Some(outcome)
    }

    fn observe_nyquist(&mut self, nyquist: f64) {
        match self.nyquist {
            Some(previous) if previous == nyquist => {}
            Some(previous) => {
                tracing::info!(
                    "Sample rate changed: nyquist {}Hz -> {}Hz (range kept at {})",
                    previous,
                    nyquist,
                    self.range.get()
                );
                self.nyquist = Some(nyquist);
            }
            None => {
                tracing::debug!("Source ready: nyquist {}Hz", nyquist);
                self.nyquist = Some(nyquist);
            }
        }
    }

    /// Forwards a wheel event to the zoom controller.
    pub fn on_wheel(&mut self, gesture: &ZoomGesture) -> GestureOutcome {
        if !self.live {
            return GestureOutcome::Ignored;
        }
        self.zoom
            .on_gesture(gesture, self.range.get(), self.nyquist)
    }

    /// One zoom tick anchored at the canvas centre.
    pub fn zoom_at_center(&mut self, zoom_in: bool) -> GestureOutcome {
        let width = f64::from(self.render.width);
        let gesture = ZoomGesture {
            pointer_x: width / 2.0,
            canvas_width: width,
            delta: if zoom_in { -1.0 } else { 1.0 },
            modifier_held: true,
        };
        self.on_wheel(&gesture)
    }

    /// Copies the source's current frame into the saved slot.
    ///
    /// Returns `false`, leaving any previous saved frame untouched, when the
    /// source has no data yet.
    pub fn save_frame(&mut self, source: &dyn SpectrumSource) -> bool {
        match source.frame() {
            Some(frame) if !frame.bins.is_empty() => {
                self.saved.save(frame.bins);
                true
            }
            _ => {
                tracing::debug!("Save requested but no live data is available");
                false
            }
        }
    }

    pub fn clear_saved(&mut self) {
        self.saved.clear();
    }

    pub fn edit_min(&mut self, value: f64) -> bool {
        self.range.edit_min(value)
    }

    /// Sets the upper bound, clamped to the current nyquist frequency (or the
    /// fallback while the source is not ready).
    pub fn edit_max(&mut self, value: f64) -> bool {
        let nyquist = self.effective_nyquist();
        self.range.edit_max(value, nyquist)
    }

    pub fn reset_range(&mut self) {
        self.range.reset();
    }

    /// Stops all further ticks and discards any pending zoom commit.
    pub fn teardown(&mut self) {
        if self.live {
            tracing::debug!("Visualizer torn down");
        }
        self.live = false;
        self.zoom.teardown();
    }

    #[cfg(test)]
    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn range(&self) -> FrequencyRange {
        self.range.get()
    }

    pub fn has_saved_frame(&self) -> bool {
        self.saved.is_saved()
    }

    #[cfg(test)]
    pub fn has_pending_zoom(&self) -> bool {
        self.zoom.has_pending()
    }

    pub fn effective_nyquist(&self) -> f64 {
        self.nyquist
            .unwrap_or(self.zoom.config().fallback_nyquist)
    }
}
