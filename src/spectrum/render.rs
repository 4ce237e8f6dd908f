//! Per-frame mapping from magnitude bins to bar geometry.
//!
//! Each pass clears the surface, validates the visible window, draws one bar
//! per visible bin (overlaid on the saved frame when there is one) and finally
//! the frequency axis labels.

use serde::{Deserialize, Serialize};

use super::range::FrequencyRange;
use super::surface::{
    Surface, AGREEMENT_TINT, BACKGROUND, DIAGNOSTIC_TINT, LABEL_TINT, LIVE_TINT, SAVED_TINT,
};

const WAITING_MESSAGE: &str = "Waiting for audio data...";

/// Canvas and bar geometry settings (`[display]` in the config file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Logical canvas width in pixels.
    pub width: u32,
    /// Logical canvas height in pixels.
    pub height: u32,
    /// Pixels reserved at the bottom of the canvas for axis labels.
    pub bottom_padding: f64,
    /// Lower bound of the window shown at startup, in Hz.
    pub min_freq: f64,
    /// Upper bound of the window shown at startup, in Hz.
    pub max_freq: f64,
    /// Number of frequency labels along the axis.
    pub label_count: usize,
    /// Distance of the label baseline from the canvas bottom.
    pub label_offset: f64,
    /// Gap between bars while there are fewer bars than pixels.
    pub bar_spacing: f64,
    /// Narrowest bar ever drawn.
    pub min_bar_width: f64,
    /// Bars shorter than this many pixels are not drawn.
    pub noise_floor: f64,
    /// Target time between render ticks, in milliseconds.
    pub frame_interval_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 200,
            bottom_padding: 20.0,
            min_freq: 20.0,
            max_freq: 3000.0,
            label_count: 6,
            label_offset: 5.0,
            bar_spacing: 0.1,
            min_bar_width: 0.1,
            noise_floor: 0.5,
            frame_interval_ms: 16,
        }
    }
}

impl RenderConfig {
    pub fn default_range(&self) -> FrequencyRange {
        FrequencyRange::new(self.min_freq, self.max_freq)
    }
}

/// What a render pass ended up showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No spectrum data yet; a placeholder was drawn.
    Waiting,
    /// The clamped window was empty; a diagnostic was drawn.
    InvalidRange,
    Drawn {
        visible_bars: usize,
        drawn_bars: usize,
    },
}

/// Horizontal placement of the visible bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub min_index: usize,
    pub max_index: usize,
    pub visible_bars: usize,
    pub spacing: f64,
    pub bar_width: f64,
}

impl BarLayout {
    /// Maps a clamped, valid range onto `bin_count` bins spread across `width`.
    pub fn compute(
        range: FrequencyRange,
        nyquist: f64,
        bin_count: usize,
        width: f64,
        config: &RenderConfig,
    ) -> Self {
        let bins = bin_count as f64;
        let min_index = ((range.min_freq / nyquist) * bins).floor().clamp(0.0, bins) as usize;
        let max_index = ((range.max_freq / nyquist) * bins).ceil().clamp(0.0, bins) as usize;
        let visible_bars = max_index.saturating_sub(min_index).max(1);

        // Sub-pixel bars would show the gaps as stripes.
        let spacing = if visible_bars as f64 > width {
            0.0
        } else {
            config.bar_spacing
        };
        let total_spacing = (visible_bars - 1) as f64 * spacing;
        let bar_width = ((width - total_spacing) / visible_bars as f64).max(config.min_bar_width);

        Self {
            min_index,
            max_index,
            visible_bars,
            spacing,
            bar_width,
        }
    }
}

/// Heights of the three overlay layers of one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarStack {
    /// Full saved height, drawn first.
    pub saved: f64,
    /// `min(live, saved)`, drawn over the saved layer.
    pub agreement: f64,
    /// `max(0, live - saved)`, drawn opaque above the saved height.
    pub excess: f64,
}

impl BarStack {
    /// Saved height left uncovered because the live signal fell below it.
    #[cfg(test)]
    pub fn saved_only(&self) -> f64 {
        self.saved - self.agreement
    }

    pub fn live(&self) -> f64 {
        self.agreement + self.excess
    }
}

/// Splits a bar into its overlay layers.
///
/// Without a saved value the whole live height is excess.
pub fn composite_bar(live: f64, saved: Option<f64>) -> BarStack {
    let saved = saved.unwrap_or(0.0);
    let agreement = live.min(saved).max(0.0);
    BarStack {
        saved,
        agreement,
        excess: (live - saved).max(0.0),
    }
}

/// Draws the placeholder shown while the spectrum source is not ready.
pub fn render_waiting<S: Surface + ?Sized>(surface: &mut S) -> RenderOutcome {
    let (width, height) = (surface.width(), surface.height());
    surface.fill_rect(0.0, 0.0, width, height, BACKGROUND);
    surface.fill_text(WAITING_MESSAGE, width / 2.0, height / 2.0, LABEL_TINT);
    RenderOutcome::Waiting
}

/// Draws one frame of the spectrum.
///
/// `live` is only borrowed for the duration of the call. An empty or inverted
/// window draws a diagnostic instead of bars.
pub fn render_frame<S: Surface + ?Sized>(
    surface: &mut S,
    live: &[u8],
    saved: Option<&[u8]>,
    range: FrequencyRange,
    sample_rate: f64,
    config: &RenderConfig,
) -> RenderOutcome {
    let nyquist = sample_rate / 2.0;
    if live.is_empty() || nyquist <= 0.0 {
        return render_waiting(surface);
    }

    let (width, height) = (surface.width(), surface.height());
    surface.fill_rect(0.0, 0.0, width, height, BACKGROUND);

    let range = range.clamp_to(nyquist);
    if !range.is_valid() {
        surface.fill_text(
            &format!(
                "Invalid Range: Min {}Hz >= Max {}Hz",
                range.min_freq.round(),
                range.max_freq.round()
            ),
            width / 2.0,
            height / 2.0,
            DIAGNOSTIC_TINT,
        );
        return RenderOutcome::InvalidRange;
    }

    let draw_height = (height - config.bottom_padding).max(0.0);
    let layout = BarLayout::compute(range, nyquist, live.len(), width, config);

    let mut x = 0.0;
    let mut drawn_bars = 0;
    for i in layout.min_index..layout.max_index {
        let live_height = f64::from(live[i]) / 255.0 * draw_height;
        if live_height >= config.noise_floor {
            let saved_height = saved
                .and_then(|frame| frame.get(i))
                .map(|&value| f64::from(value) / 255.0 * draw_height);
            draw_bar(
                surface,
                x,
                layout.bar_width,
                draw_height,
                composite_bar(live_height, saved_height),
            );
            drawn_bars += 1;
        }
        x += layout.bar_width + layout.spacing;
    }

    draw_axis_labels(surface, range, config);

    RenderOutcome::Drawn {
        visible_bars: layout.visible_bars,
        drawn_bars,
    }
}

fn draw_bar<S: Surface + ?Sized>(
    surface: &mut S,
    x: f64,
    bar_width: f64,
    baseline: f64,
    stack: BarStack,
) {
    if stack.saved > 0.0 {
        surface.fill_rect(x, baseline - stack.saved, bar_width, stack.saved, SAVED_TINT);
        if stack.agreement > 0.0 {
            surface.fill_rect(
                x,
                baseline - stack.agreement,
                bar_width,
                stack.agreement,
                AGREEMENT_TINT,
            );
        }
    }
    if stack.excess > 0.0 {
        surface.fill_rect(
            x,
            baseline - stack.live(),
            bar_width,
            stack.excess,
            LIVE_TINT,
        );
    }
}

/// Draws evenly spaced (by frequency) axis labels, kept inside the canvas.
pub fn draw_axis_labels<S: Surface + ?Sized>(
    surface: &mut S,
    range: FrequencyRange,
    config: &RenderConfig,
) {
    let (width, height) = (surface.width(), surface.height());
    let baseline = height - config.label_offset;
    let span = range.span();

    if span <= 0.0 || config.label_count < 2 {
        let text = format_hz(range.min_freq);
        surface.fill_text(&text, width / 2.0, baseline, LABEL_TINT);
        return;
    }

    let steps = (config.label_count - 1) as f64;
    for k in 0..config.label_count {
        let freq = range.min_freq + span * k as f64 / steps;
        let marker_x = (freq - range.min_freq) / span * width;
        let text = format_hz(freq);
        let half = surface.measure_text(&text) / 2.0;
        let clamped_x = half.max((width - half).min(marker_x));
        surface.fill_text(&text, clamped_x, baseline, LABEL_TINT);
    }
}

fn format_hz(freq: f64) -> String {
    format!("{} Hz", freq.round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::surface::tests::RecordingSurface;

    const SAMPLE_RATE: f64 = 44100.0;

    fn frame(len: usize, value: u8) -> Vec<u8> {
        vec![value; len]
    }

    #[test]
    fn test_visible_bars_never_below_one() {
        let config = RenderConfig::default();
        let ranges = [
            FrequencyRange::new(0.0, 22050.0),
            FrequencyRange::new(1000.0, 1000.0001),
            FrequencyRange::new(22049.9, 22050.0),
            FrequencyRange::new(0.0, 0.001),
            FrequencyRange::new(20.0, 3000.0),
        ];
        for bins in [1usize, 16, 4096] {
            for range in ranges {
                let layout = BarLayout::compute(range, 22050.0, bins, 800.0, &config);
                assert!(layout.visible_bars >= 1, "{range:?} with {bins} bins");
                assert!(layout.bar_width > 0.0);
                assert!(layout.max_index <= bins);
            }
        }
    }

    #[test]
    fn test_layout_for_default_window() {
        let config = RenderConfig::default();
        let layout =
            BarLayout::compute(FrequencyRange::new(20.0, 3000.0), 22050.0, 4096, 800.0, &config);

        assert_eq!(layout.min_index, 3);
        assert_eq!(layout.max_index, 558);
        assert_eq!(layout.visible_bars, 555);
        assert_eq!(layout.spacing, 0.1);
        let total = layout.visible_bars as f64 * layout.bar_width + 554.0 * layout.spacing;
        assert!((total - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_spacing_in_sub_pixel_regime() {
        let config = RenderConfig::default();
        let layout =
            BarLayout::compute(FrequencyRange::new(0.0, 22050.0), 22050.0, 4096, 800.0, &config);

        assert_eq!(layout.visible_bars, 4096);
        assert_eq!(layout.spacing, 0.0);
        assert!((layout.bar_width - 800.0 / 4096.0).abs() < 1e-12);
    }

    #[test]
    fn test_composite_layers_sum_to_live() {
        for live in [0.0, 10.0, 150.0, 255.0] {
            for saved in [0.0, 10.0, 150.0, 200.0] {
                let stack = composite_bar(live, Some(saved));
                assert_eq!(stack.agreement, f64::min(live, saved));
                assert_eq!(stack.excess, f64::max(0.0, live - saved));
                assert_eq!(stack.agreement + stack.excess, live);
            }
        }
    }

    #[test]
    fn test_live_below_saved_leaves_saved_remainder() {
        let stack = composite_bar(150.0, Some(200.0));
        assert_eq!(stack.agreement, 150.0);
        assert_eq!(stack.excess, 0.0);
        assert_eq!(stack.saved_only(), 50.0);
    }

    #[test]
    fn test_saved_frame_overlay_draws_three_layers() {
        let config = RenderConfig::default();
        let mut surface = RecordingSurface::new(800.0, 200.0);
        let mut live = frame(16, 0);
        let mut saved = frame(16, 0);
        live[5] = 150;
        saved[5] = 200;

        // Bin 5 of 16 covers 6890.625..8268.75 Hz.
        let range = FrequencyRange::new(6890.625, 8268.75);
        let outcome = render_frame(&mut surface, &live, Some(&saved), range, SAMPLE_RATE, &config);

        assert_eq!(
            outcome,
            RenderOutcome::Drawn {
                visible_bars: 1,
                drawn_bars: 1
            }
        );
        let saved_rects = surface.rects_with(SAVED_TINT);
        let agreement_rects = surface.rects_with(AGREEMENT_TINT);
        assert_eq!(saved_rects.len(), 1);
        assert_eq!(agreement_rects.len(), 1);
        assert!(surface.rects_with(LIVE_TINT).is_empty());

        let draw_height = 180.0;
        let (_, y, _, h) = saved_rects[0];
        assert!((h - 200.0 / 255.0 * draw_height).abs() < 1e-9);
        assert!((y + h - draw_height).abs() < 1e-9);
        let (_, _, _, h) = agreement_rects[0];
        assert!((h - 150.0 / 255.0 * draw_height).abs() < 1e-9);
    }

    #[test]
    fn test_live_above_saved_draws_excess_on_top() {
        let config = RenderConfig::default();
        let mut surface = RecordingSurface::new(800.0, 200.0);
        let live = frame(4, 255);
        let saved = frame(4, 51);

        render_frame(
            &mut surface,
            &live,
            Some(&saved),
            FrequencyRange::new(0.0, 22050.0),
            SAMPLE_RATE,
            &config,
        );

        let excess = surface.rects_with(LIVE_TINT);
        assert_eq!(excess.len(), 4);
        let (_, y, _, h) = excess[0];
        assert!(y.abs() < 1e-9);
        assert!((h - 180.0 * (204.0 / 255.0)).abs() < 1e-9);
    }

    #[test]
    fn test_without_saved_frame_only_live_bars() {
        let config = RenderConfig::default();
        let mut surface = RecordingSurface::new(800.0, 200.0);
        let live = frame(8, 128);

        render_frame(
            &mut surface,
            &live,
            None,
            FrequencyRange::new(0.0, 22050.0),
            SAMPLE_RATE,
            &config,
        );

        let bars = surface.rects_with(LIVE_TINT);
        assert_eq!(bars.len(), 8);
        assert!(surface.rects_with(SAVED_TINT).is_empty());
        // Cursor advances by width plus spacing.
        assert!((bars[1].0 - bars[0].0 - (bars[0].2 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_bars_below_noise_floor_are_skipped() {
        let config = RenderConfig::default();
        // 80px of bar height puts a magnitude of 1 under the floor.
        let mut surface = RecordingSurface::new(800.0, 100.0);
        let live = vec![0u8, 1, 200, 0];
        let saved = frame(4, 255);

        let outcome = render_frame(
            &mut surface,
            &live,
            Some(&saved),
            FrequencyRange::new(0.0, 22050.0),
            SAMPLE_RATE,
            &config,
        );

        assert_eq!(
            outcome,
            RenderOutcome::Drawn {
                visible_bars: 4,
                drawn_bars: 1
            }
        );
        assert_eq!(surface.rects_with(SAVED_TINT).len(), 1);
    }

    #[test]
    fn test_invalid_range_draws_diagnostic() {
        let config = RenderConfig::default();
        let mut surface = RecordingSurface::new(800.0, 200.0);
        let live = frame(8, 200);

        let outcome = render_frame(
            &mut surface,
            &live,
            None,
            FrequencyRange::new(23000.0, 24000.0),
            SAMPLE_RATE,
            &config,
        );

        assert_eq!(outcome, RenderOutcome::InvalidRange);
        assert!(surface.rects_with(LIVE_TINT).is_empty());
        let texts = surface.texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "Invalid Range: Min 23000Hz >= Max 22050Hz");
    }

    #[test]
    fn test_empty_frame_renders_placeholder() {
        let mut surface = RecordingSurface::new(800.0, 200.0);
        let outcome = render_frame(
            &mut surface,
            &[],
            None,
            FrequencyRange::default(),
            SAMPLE_RATE,
            &RenderConfig::default(),
        );

        assert_eq!(outcome, RenderOutcome::Waiting);
        assert_eq!(surface.texts()[0].0, WAITING_MESSAGE);
    }

    #[test]
    fn test_axis_labels_stay_inside_canvas() {
        let config = RenderConfig::default();
        let mut surface = RecordingSurface::new(800.0, 200.0);

        draw_axis_labels(&mut surface, FrequencyRange::new(20.0, 3000.0), &config);

        let texts = surface.texts();
        assert_eq!(texts.len(), 6);
        assert_eq!(texts[0].0, "20 Hz");
        assert_eq!(texts[5].0, "3000 Hz");
        assert_eq!(texts[1].0, "616 Hz");
        for (text, x) in &texts {
            let half = text.len() as f64 * 3.0;
            assert!(x - half >= 0.0 && x + half <= 800.0, "{text} at {x}");
        }
        assert_eq!(texts[1].1, 160.0);
    }

    #[test]
    fn test_collapsed_span_draws_single_label() {
        let config = RenderConfig::default();
        let mut surface = RecordingSurface::new(800.0, 200.0);

        draw_axis_labels(&mut surface, FrequencyRange::new(440.0, 440.0), &config);

        assert_eq!(surface.texts(), vec![("440 Hz".to_string(), 400.0)]);
    }
}
