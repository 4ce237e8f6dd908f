//! Pixel framebuffer surface shown in the terminal.
//!
//! Bars are rasterised at the configured logical resolution with fractional
//! coverage, so sub-pixel bars still contribute colour. When rendered as a
//! ratatui widget the framebuffer is box-filtered down to the target area,
//! two vertical samples per cell using the upper half block glyph.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use super::surface::{Rgba, Surface};

const HALF_BLOCK: &str = "▀";

#[derive(Debug, Clone, PartialEq)]
struct TextRun {
    text: String,
    x: f64,
    y: f64,
    color: Rgba,
}

/// RGB framebuffer with queued text, implementing [`Surface`].
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<[f32; 3]>,
    texts: Vec<TextRun>,
    /// Logical pixels covered by one terminal column.
    glyph_width: f64,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1) as usize;
        let height = height.max(1) as usize;
        Self {
            width,
            height,
            pixels: vec![[0.0; 3]; width * height],
            texts: Vec::new(),
            glyph_width: 6.0,
        }
    }

    /// Prepares for a new pass: drops queued text and adopts the glyph width
    /// of a terminal area `columns` cells wide.
    pub fn begin_frame(&mut self, columns: u16) {
        self.texts.clear();
        if columns > 0 {
            self.glyph_width = self.width as f64 / f64::from(columns);
        }
    }

    /// Colour of one pixel as 8-bit RGB.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        to_rgb8(self.pixels[y * self.width + x])
    }

    fn blend(&mut self, x: usize, y: usize, color: Rgba, alpha: f32) {
        let src = [
            f32::from(color.r) / 255.0,
            f32::from(color.g) / 255.0,
            f32::from(color.b) / 255.0,
        ];
        let dst = &mut self.pixels[y * self.width + x];
        for (d, s) in dst.iter_mut().zip(src) {
            *d = *d * (1.0 - alpha) + s * alpha;
        }
    }

    fn average(&self, x0: usize, x1: usize, y0: usize, y1: usize) -> Color {
        let mut sum = [0.0f32; 3];
        let mut count = 0usize;
        for y in y0..y1 {
            for x in x0..x1 {
                let px = self.pixels[y * self.width + x];
                for (s, p) in sum.iter_mut().zip(px) {
                    *s += p;
                }
                count += 1;
            }
        }
        if count == 0 {
            return Color::Rgb(0, 0, 0);
        }
        let [r, g, b] = to_rgb8(sum.map(|s| s / count as f32));
        Color::Rgb(r, g, b)
    }
}

impl Surface for PixelCanvas {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn height(&self) -> f64 {
        self.height as f64
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let (x0, x1) = (x.max(0.0), (x + width).min(self.width as f64));
        let (y0, y1) = (y.max(0.0), (y + height).min(self.height as f64));
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for py in y0.floor() as usize..(y1.ceil() as usize).min(self.height) {
            let cover_y = coverage(py, y0, y1);
            for px in x0.floor() as usize..(x1.ceil() as usize).min(self.width) {
                let alpha = color.a * (coverage(px, x0, x1) * cover_y) as f32;
                if alpha > 0.0 {
                    self.blend(px, py, color, alpha.min(1.0));
                }
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba) {
        self.texts.push(TextRun {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }

    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.glyph_width
    }
}

/// Fraction of pixel `index` covered by the span `[start, end)`.
fn coverage(index: usize, start: f64, end: f64) -> f64 {
    let lo = index as f64;
    (end.min(lo + 1.0) - start.max(lo)).clamp(0.0, 1.0)
}

fn to_rgb8(px: [f32; 3]) -> [u8; 3] {
    px.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

impl Widget for &PixelCanvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let columns = usize::from(area.width);
        let rows = usize::from(area.height) * 2;
        // Every cell samples at least one pixel, even when upscaling.
        let band = |i: usize, cells: usize, size: usize| {
            let start = (i * size / cells).min(size - 1);
            let end = ((i + 1) * size / cells).clamp(start + 1, size);
            (start, end)
        };

        for cy in 0..area.height {
            let top = usize::from(cy) * 2;
            let (upper_y0, upper_y1) = band(top, rows, self.height);
            let (lower_y0, lower_y1) = band(top + 1, rows, self.height);
            for cx in 0..area.width {
                let (x0, x1) = band(usize::from(cx), columns, self.width);
                let upper = self.average(x0, x1, upper_y0, upper_y1);
                let lower = self.average(x0, x1, lower_y0, lower_y1);
                buf[(area.x + cx, area.y + cy)]
                    .set_symbol(HALF_BLOCK)
                    .set_fg(upper)
                    .set_bg(lower);
            }
        }

        let scale_x = f64::from(area.width) / self.width as f64;
        let scale_y = f64::from(area.height) / self.height as f64;
        for run in &self.texts {
            let len = run.text.chars().count() as f64;
            let start = run.x * scale_x - len / 2.0;
            let col = start.round().clamp(0.0, f64::from(area.width.saturating_sub(1))) as u16;
            let row = ((run.y * scale_y).ceil() - 1.0)
                .clamp(0.0, f64::from(area.height - 1)) as u16;
            let style = Style::default().fg(Color::Rgb(run.color.r, run.color.g, run.color.b));
            buf.set_stringn(
                area.x + col,
                area.y + row,
                &run.text,
                usize::from(area.width - col),
                style,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::surface::{BACKGROUND, LIVE_TINT, SAVED_TINT};

    #[test]
    fn test_opaque_fill_sets_pixels() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.fill_rect(1.0, 1.0, 2.0, 2.0, LIVE_TINT);

        assert_eq!(canvas.pixel(1, 1), [30, 144, 255]);
        assert_eq!(canvas.pixel(2, 2), [30, 144, 255]);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0]);
        assert_eq!(canvas.pixel(3, 3), [0, 0, 0]);
    }

    #[test]
    fn test_translucent_fill_blends_with_background() {
        let mut canvas = PixelCanvas::new(2, 2);
        canvas.fill_rect(0.0, 0.0, 2.0, 2.0, BACKGROUND);
        canvas.fill_rect(0.0, 0.0, 2.0, 2.0, SAVED_TINT);

        assert_eq!(canvas.pixel(0, 0), [153, 0, 0]);
    }

    #[test]
    fn test_sub_pixel_fill_uses_coverage() {
        let mut canvas = PixelCanvas::new(2, 1);
        canvas.fill_rect(0.0, 0.0, 0.5, 1.0, Rgba::rgb(255, 255, 255));

        assert_eq!(canvas.pixel(0, 0), [128, 128, 128]);
        assert_eq!(canvas.pixel(1, 0), [0, 0, 0]);
    }

    #[test]
    fn test_fill_outside_canvas_is_clipped() {
        let mut canvas = PixelCanvas::new(2, 2);
        canvas.fill_rect(-5.0, -5.0, 3.0, 3.0, LIVE_TINT);
        canvas.fill_rect(5.0, 5.0, 3.0, 3.0, LIVE_TINT);

        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(canvas.pixel(x, y), [0, 0, 0]);
            }
        }
    }

    #[test]
    fn test_widget_maps_halves_to_fg_and_bg() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.fill_rect(0.0, 0.0, 4.0, 2.0, Rgba::rgb(255, 0, 0));

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        (&canvas).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), HALF_BLOCK);
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_widget_overlays_centered_text() {
        let mut canvas = PixelCanvas::new(100, 20);
        canvas.begin_frame(10);
        canvas.fill_text("ab", 50.0, 10.0, Rgba::rgb(255, 255, 255));

        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        (&canvas).render(area, &mut buf);

        assert_eq!(buf[(4, 0)].symbol(), "a");
        assert_eq!(buf[(5, 0)].symbol(), "b");
        assert_eq!(canvas.measure_text("ab"), 20.0);
    }
}
