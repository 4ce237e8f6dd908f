//! Interactive spectrum rendering core.
//!
//! Holds the visible frequency window, the frozen comparison frame, the
//! throttled wheel-zoom controller and the renderer that turns magnitude bins
//! into bars on a [`Surface`].

pub mod canvas;
pub mod range;
pub mod render;
pub mod saved;
pub mod surface;
pub mod throttle;
pub mod zoom;

pub use canvas::PixelCanvas;
pub use range::{FrequencyRange, RangeState};
pub use render::{render_frame, render_waiting, RenderConfig, RenderOutcome};
pub use saved::SavedFrame;
pub use surface::Surface;
pub use throttle::{Clock, SystemClock};
pub use zoom::{GestureOutcome, ZoomConfig, ZoomController, ZoomGesture};
