//! Full-screen error display shown before liveq gives up on a command.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};
use std::io::{self, Stdout};

const ERROR_BG: Color = Color::Rgb(255, 0, 0);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);
const DISMISS_HINT: &str = "press any key";

/// Red full-screen message, dismissed by any key press.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    cleaned_up: bool,
}

impl ErrorScreen {
    /// Creates a new error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen {
            terminal,
            cleaned_up: false,
        })
    }

    /// Shows `error_message` until a key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal
                .draw(|frame| draw_error(frame, error_message))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        self.cleaned_up = true;

        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Paints the whole frame red with the message wrapped to 80% of the width,
/// starting at the vertical middle.
fn draw_error(frame: &mut Frame, error_message: &str) {
    let area = frame.area();
    let style = Style::default().fg(ERROR_FG).bg(ERROR_BG);
    frame.render_widget(Block::default().style(style), area);

    let message_area = Rect {
        x: area.x + area.width / 10,
        y: area.y + area.height / 2,
        width: area.width * 8 / 10,
        height: area.height - area.height / 2,
    };
    let paragraph = Paragraph::new(error_message)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, message_area);

    if area.height > 1 {
        let hint_area = Rect {
            y: area.y + area.height - 1,
            height: 1,
            ..area
        };
        frame.render_widget(
            Paragraph::new(DISMISS_HINT)
                .style(style)
                .alignment(Alignment::Center),
            hint_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_error_fills_screen_red_with_centered_message() {
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal
            .draw(|frame| draw_error(frame, "Audio Error"))
            .unwrap();

        let buffer = terminal.backend().buffer();
        assert!(buffer.content().iter().all(|cell| cell.bg == ERROR_BG));

        let row: String = (0..40u16).map(|x| buffer[(x, 5u16)].symbol()).collect();
        assert_eq!(row.trim(), "Audio Error");

        let hint: String = (0..40u16).map(|x| buffer[(x, 9u16)].symbol()).collect();
        assert_eq!(hint.trim(), DISMISS_HINT);
    }
}
