//! Immediate-mode 2D drawing boundary used by the frame renderer.

/// Straight (non-premultiplied) RGBA colour with alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Canvas background.
pub const BACKGROUND: Rgba = Rgba::rgb(0, 0, 0);
/// Full height of the saved frame.
pub const SAVED_TINT: Rgba = Rgba::rgba(255, 0, 0, 0.6);
/// Portion where live and saved heights overlap.
pub const AGREEMENT_TINT: Rgba = Rgba::rgba(30, 144, 255, 0.4);
/// Live bars and the part of a live bar above the saved frame.
pub const LIVE_TINT: Rgba = Rgba::rgb(30, 144, 255);
pub const LABEL_TINT: Rgba = Rgba::rgb(255, 255, 255);
pub const DIAGNOSTIC_TINT: Rgba = Rgba::rgb(255, 165, 0);

/// A rectangular pixel canvas with fixed logical dimensions.
///
/// Coordinates are logical pixels with the origin at the top-left corner and
/// `y` growing downwards. Text is centred on its `x` and `y` is the baseline.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba);
    fn measure_text(&self, text: &str) -> f64;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One recorded drawing call.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum DrawOp {
        Rect {
            x: f64,
            y: f64,
            width: f64,
            height: f64,
            color: Rgba,
        },
        Text {
            text: String,
            x: f64,
            y: f64,
            color: Rgba,
        },
    }

    /// Surface double that records every call instead of drawing.
    pub(crate) struct RecordingSurface {
        pub(crate) width: f64,
        pub(crate) height: f64,
        pub(crate) ops: Vec<DrawOp>,
    }

    impl RecordingSurface {
        pub(crate) fn new(width: f64, height: f64) -> Self {
            Self {
                width,
                height,
                ops: Vec::new(),
            }
        }

        pub(crate) fn rects_with(&self, color: Rgba) -> Vec<(f64, f64, f64, f64)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Rect {
                        x,
                        y,
                        width,
                        height,
                        color: c,
                    } if *c == color => Some((*x, *y, *width, *height)),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn texts(&self) -> Vec<(String, f64)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Text { text, x, .. } => Some((text.clone(), *x)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> f64 {
            self.width
        }

        fn height(&self) -> f64 {
            self.height
        }

        fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
            self.ops.push(DrawOp::Rect {
                x,
                y,
                width,
                height,
                color,
            });
        }

        fn fill_text(&mut self, text: &str, x: f64, y: f64, color: Rgba) {
            self.ops.push(DrawOp::Text {
                text: text.to_string(),
                x,
                y,
                color,
            });
        }

        fn measure_text(&self, text: &str) -> f64 {
            text.chars().count() as f64 * 6.0
        }
    }
}
