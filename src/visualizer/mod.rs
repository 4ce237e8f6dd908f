//! The live spectrum view: per-instance state and its terminal front end.

pub mod state;
pub mod ui;

pub use state::Visualizer;
pub use ui::{UiCommand, VisualizerTui};
