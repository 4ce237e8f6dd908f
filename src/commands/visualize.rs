//! Live spectrum visualization.
//!
//! Opens the spectrum source, then runs the render loop until the user quits.
//! Supports an external "save frame" trigger via SIGUSR1.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::capture::{self, SpectrumSource};
use crate::config::LiveqConfig;
use crate::spectrum::GestureOutcome;
use crate::ui::ErrorScreen;
use crate::visualizer::{UiCommand, Visualizer, VisualizerTui};

/// Handles the live spectrum view.
///
/// `device` overrides `[audio].device`; `file` analyses a WAV file instead
/// of an input device.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the spectrum source cannot be opened
/// - If the terminal fails
pub async fn handle_visualize(
    device: Option<String>,
    file: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== liveq Visualizer Started ===");

    let config = match LiveqConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            show_error(&format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/liveq/liveq.toml file and try again."
            ))?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, fft_size={}, range={}, throttle={}ms",
        device.as_deref().unwrap_or(&config.audio.device),
        config.audio.fft_size,
        config.display.default_range(),
        config.zoom.throttle_ms
    );

    let mut source = match capture::open_source(&config.audio, device.as_deref(), file.as_deref())
    {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Failed to open spectrum source: {}", e);
            show_error(&format!(
                "Audio Error:\n\n{e}\n\nPlease check your audio configuration and try again."
            ))?;
            return Err(e);
        }
    };

    let mut visualizer = Visualizer::new(config.display.clone(), config.zoom.clone());
    let mut tui = VisualizerTui::new(config.display.width, config.display.height)
        .map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    let save_requested = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&save_requested))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut ticker =
        tokio::time::interval(Duration::from_millis(config.display.frame_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!("Entering render loop. Press 's' to save a frame, 'q' to quit.");
    let result = run_loop(
        &mut ticker,
        &mut visualizer,
        &mut tui,
        source.as_mut(),
        &save_requested,
    )
    .await;

    visualizer.teardown();
    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;
    drop(source);

    match &result {
        Ok(()) => tracing::info!("=== liveq Visualizer Exited Successfully ==="),
        Err(e) => tracing::error!("Render loop failed: {e}"),
    }
    result
}

async fn run_loop(
    ticker: &mut tokio::time::Interval,
    visualizer: &mut Visualizer,
    tui: &mut VisualizerTui,
    source: &mut dyn SpectrumSource,
    save_requested: &AtomicBool,
) -> Result<(), anyhow::Error> {
    let mut frame_count = 0u64;

    loop {
        ticker.tick().await;

        if save_requested.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: saving current frame");
            visualizer.save_frame(source);
        }

        for command in tui.handle_input(visualizer.range())? {
            if !apply_command(visualizer, source, command) {
                return Ok(());
            }
        }

        let outcome = tui.draw(visualizer, source)?;

        frame_count += 1;
        if frame_count % 600 == 0 {
            tracing::debug!(
                "Frame {}: {:?}, range {}",
                frame_count,
                outcome,
                visualizer.range()
            );
        }
    }
}

/// Applies one UI command. Returns `false` when the loop should stop.
fn apply_command(
    visualizer: &mut Visualizer,
    source: &dyn SpectrumSource,
    command: UiCommand,
) -> bool {
    match command {
        UiCommand::Quit => {
            tracing::debug!("Quit requested");
            return false;
        }
        UiCommand::SaveFrame => {
            visualizer.save_frame(source);
        }
        UiCommand::ClearSaved => visualizer.clear_saved(),
        UiCommand::ResetRange => visualizer.reset_range(),
        UiCommand::Zoom { zoom_in } => {
            visualizer.zoom_at_center(zoom_in);
        }
        UiCommand::Wheel(gesture) => {
            if visualizer.on_wheel(&gesture) == GestureOutcome::Ignored {
                tracing::trace!("Wheel without modifier left unhandled");
            }
        }
        UiCommand::SetMin(value) => {
            if !visualizer.edit_min(value) {
                tracing::debug!("Min edit {} rejected", value);
            }
        }
        UiCommand::SetMax(value) => {
            if !visualizer.edit_max(value) {
                tracing::debug!("Max edit {} rejected", value);
            }
        }
    }
    true
}

fn show_error(message: &str) -> anyhow::Result<()> {
    let mut error_screen = ErrorScreen::new()?;
    error_screen.show_error(message)?;
    error_screen.cleanup()?;
    Ok(())
}
