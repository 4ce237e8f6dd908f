//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// A live terminal EQ visualizer with zoomable spectrum and frozen-frame comparison
#[derive(Parser)]
#[command(name = "liveq")]
#[command(version)]
#[command(about = "Live terminal EQ visualizer")]
#[command(long_about = "Live terminal EQ visualizer\n\nShows the spectrum of an input device (or a looping WAV file) as bars over a\nzoomable frequency window. Save a frame to compare later audio against it.\n\nDEFAULT COMMAND:\n    If no command is specified, 'visualize' is used by default.\n    Visualize options (-d, -f) can be used without explicitly saying 'visualize'.\n\nEXAMPLES:\n    # Visualize the default input device\n    $ liveq\n    \n    # Use input device #2 from 'liveq list-devices'\n    $ liveq -d 2\n    \n    # Analyse a WAV file in a loop\n    $ liveq -f sweep.wav\n    \n    # Save the current frame from another shell\n    $ pkill -USR1 liveq\n    \n    # Edit configuration file\n    $ liveq config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/liveq/liveq.toml\n    Logs:               ~/.local/state/liveq/liveq.log.*"
)]
struct Cli {
    /// Input device name or index (visualize default command)
    #[arg(short, long, value_name = "DEVICE")]
    device: Option<String>,

    /// Analyse a WAV file instead of an input device (visualize default command)
    #[arg(short, long, value_name = "WAV")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live spectrum (default)
    ///
    /// Keys: s save frame, c clear saved frame, m/M edit min/max,
    /// +/- zoom, Ctrl+wheel zoom at pointer, r reset range, q/Esc quit.
    /// SIGUSR1 saves the current frame.
    #[command(visible_alias = "v")]
    Visualize {
        /// Input device name or index; overrides the config file
        #[arg(short, long, value_name = "DEVICE")]
        device: Option<String>,

        /// Analyse a WAV file instead of an input device
        #[arg(short, long, value_name = "WAV")]
        file: Option<PathBuf>,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in liveq.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   liveq completions bash > liveq.bash
    ///   liveq completions zsh > _liveq
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that need neither logging nor config
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "liveq", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return exit_on_error(commands::handle_list_devices()),
        Some(Commands::Logs) => return exit_on_error(commands::handle_logs()),
        _ => {}
    }

    logging::init_logging()?;
    crate::setup::run_setup_if_needed()?;

    match cli.command {
        None => commands::handle_visualize(cli.device, cli.file).await?,
        Some(Commands::Visualize { device, file }) => {
            // Explicit subcommand options take precedence over the top-level ones
            commands::handle_visualize(device.or(cli.device), file.or(cli.file)).await?;
        }
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn exit_on_error(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    Ok(())
}
