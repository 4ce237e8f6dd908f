//! Terminal user interface for the live spectrum.
//!
//! Draws a header with the visible range, the spectrum canvas, and a footer
//! that shows either key help or the numeric input for a min/max edit.
//! Mouse capture is enabled so Ctrl+wheel over the canvas can zoom.

use anyhow::Result;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::io::{self, Stdout};
use std::time::Duration;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use super::state::Visualizer;
use crate::capture::SpectrumSource;
use crate::spectrum::{Clock, FrequencyRange, PixelCanvas, RenderOutcome, ZoomGesture};

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const HELP_FG: Color = Color::Rgb(100, 100, 100);
const SAVED_FG: Color = Color::Rgb(255, 0, 0);

const HELP_TEXT: &str =
    "s save, c clear, m/M min/max, +/- zoom, ctrl+wheel zoom, r reset, q quit";

/// User command decoded from terminal input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCommand {
    Quit,
    SaveFrame,
    ClearSaved,
    Zoom { zoom_in: bool },
    ResetRange,
    Wheel(ZoomGesture),
    SetMin(f64),
    SetMax(f64),
}

/// Which bound a numeric edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Min,
    Max,
}

impl EditTarget {
    fn title(self) -> &'static str {
        match self {
            EditTarget::Min => " Min frequency (Hz) ",
            EditTarget::Max => " Max frequency (Hz) ",
        }
    }
}

/// Key and mouse decoding, independent of the terminal.
#[derive(Debug, Default)]
pub struct InputState {
    editing: Option<EditTarget>,
    input: Input,
    /// Screen area the canvas was last drawn into.
    canvas_area: Rect,
    /// Logical canvas width the pointer is mapped onto.
    canvas_width: f64,
}

impl InputState {
    pub fn new(canvas_width: f64) -> Self {
        Self {
            canvas_width,
            ..Self::default()
        }
    }

    pub fn editing(&self) -> Option<EditTarget> {
        self.editing
    }

    /// Decodes one terminal event.
    pub fn handle_event(&mut self, event: &Event, current: FrequencyRange) -> Option<UiCommand> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if self.editing.is_some() {
                    self.handle_edit_key(event, *key)
                } else {
                    self.handle_normal_key(*key, current)
                }
            }
            Event::Mouse(mouse) if self.editing.is_none() => self.wheel_gesture(mouse),
            _ => None,
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, current: FrequencyRange) -> Option<UiCommand> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                tracing::debug!("Ctrl+C pressed: quitting");
                Some(UiCommand::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc => Some(UiCommand::Quit),
            KeyCode::Char('s') => Some(UiCommand::SaveFrame),
            KeyCode::Char('c') => Some(UiCommand::ClearSaved),
            KeyCode::Char('r') => Some(UiCommand::ResetRange),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(UiCommand::Zoom { zoom_in: true }),
            KeyCode::Char('-') => Some(UiCommand::Zoom { zoom_in: false }),
            KeyCode::Char('m') => {
                self.begin_edit(EditTarget::Min, current.min_freq);
                None
            }
            KeyCode::Char('M') => {
                self.begin_edit(EditTarget::Max, current.max_freq);
                None
            }
            _ => None,
        }
    }

    fn begin_edit(&mut self, target: EditTarget, value: f64) {
        self.editing = Some(target);
        self.input = Input::new(format!("{}", value.round()));
    }

    fn handle_edit_key(&mut self, event: &Event, key: KeyEvent) -> Option<UiCommand> {
        let target = self.editing?;
        match key.code {
            KeyCode::Enter => {
                let text = self.input.value().trim().to_string();
                self.editing = None;
                self.input.reset();
                match text.parse::<f64>() {
                    Ok(value) => Some(match target {
                        EditTarget::Min => UiCommand::SetMin(value),
                        EditTarget::Max => UiCommand::SetMax(value),
                    }),
                    Err(_) => {
                        tracing::debug!("Ignoring non-numeric {:?} edit: {:?}", target, text);
                        None
                    }
                }
            }
            KeyCode::Esc => {
                self.editing = None;
                self.input.reset();
                None
            }
            _ => {
                self.input.handle_event(event);
                None
            }
        }
    }

    /// Maps a wheel event over the canvas to a zoom gesture.
    ///
    /// Wheel up is a negative delta (zoom in). The pointer is taken at the
    /// centre of the cell under the mouse.
    fn wheel_gesture(&self, mouse: &MouseEvent) -> Option<UiCommand> {
        let delta = match mouse.kind {
            MouseEventKind::ScrollUp => -1.0,
            MouseEventKind::ScrollDown => 1.0,
            _ => return None,
        };

        let area = self.canvas_area;
        if area.width == 0 || !area.contains(Position::new(mouse.column, mouse.row)) {
            return None;
        }

        let cell = f64::from(mouse.column - area.x) + 0.5;
        Some(UiCommand::Wheel(ZoomGesture {
            pointer_x: cell * self.canvas_width / f64::from(area.width),
            canvas_width: self.canvas_width,
            delta,
            modifier_held: mouse.modifiers.contains(KeyModifiers::CONTROL),
        }))
    }
}

/// Full-screen spectrum view.
pub struct VisualizerTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    canvas: PixelCanvas,
    input: InputState,
    cleaned_up: bool,
}

impl VisualizerTui {
    /// Enters the alternate screen with mouse capture enabled.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new(canvas_width: u32, canvas_height: u32) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            canvas: PixelCanvas::new(canvas_width, canvas_height),
            input: InputState::new(f64::from(canvas_width.max(1))),
            cleaned_up: false,
        })
    }

    /// Runs one visualizer tick into the canvas and draws the whole screen.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw<C: Clock>(
        &mut self,
        visualizer: &mut Visualizer<C>,
        source: &mut dyn SpectrumSource,
    ) -> Result<Option<RenderOutcome>> {
        let canvas = &mut self.canvas;
        let input = &mut self.input;
        let mut outcome = None;

        self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Block::default().style(Style::default().bg(BG)), area);

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(1),
                    Constraint::Length(if input.editing.is_some() { 3 } else { 1 }),
                ])
                .split(area);

            let canvas_area = layout[1];
            input.canvas_area = canvas_area;
            canvas.begin_frame(canvas_area.width);
            outcome = visualizer.tick(source, canvas);
            frame.render_widget(&*canvas, canvas_area);

            Self::draw_header(frame, layout[0], visualizer, outcome);
            Self::draw_footer(frame, layout[2], input);
        })?;

        Ok(outcome)
    }

    fn draw_header<C: Clock>(
        frame: &mut Frame,
        area: Rect,
        visualizer: &Visualizer<C>,
        outcome: Option<RenderOutcome>,
    ) {
        let mut spans = vec![
            Span::styled(" liveq ", Style::default().fg(FG).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {} ", visualizer.range()), Style::default().fg(FG)),
            Span::styled(
                format!(" nyquist {} Hz ", visualizer.effective_nyquist().round()),
                Style::default().fg(HELP_FG),
            ),
        ];
        if visualizer.has_saved_frame() {
            spans.push(Span::styled(" ● saved ", Style::default().fg(SAVED_FG)));
        }
        if let Some(RenderOutcome::Drawn { visible_bars, .. }) = outcome {
            spans.push(Span::styled(
                format!(" {visible_bars} bins "),
                Style::default().fg(HELP_FG),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_footer(frame: &mut Frame, area: Rect, input: &InputState) {
        let Some(target) = input.editing else {
            let help = Paragraph::new(HELP_TEXT)
                .alignment(Alignment::Center)
                .style(Style::default().fg(HELP_FG));
            frame.render_widget(help, area);
            return;
        };

        let block = Block::default().title(target.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(
            Paragraph::new(input.input.value()).style(Style::default().fg(FG)),
            inner,
        );

        let cursor_x = inner.x + input.input.cursor() as u16;
        frame.set_cursor_position(Position::new(cursor_x, inner.y));
    }

    /// Drains pending terminal events without blocking.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, current: FrequencyRange) -> Result<Vec<UiCommand>> {
        let mut commands = Vec::new();
        while event::poll(Duration::ZERO)? {
            let event = event::read()?;
            if let Some(command) = self.input.handle_event(&event, current) {
                commands.push(command);
            }
        }
        Ok(commands)
    }

    /// Restores the terminal. Safe to call more than once.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        self.cleaned_up = true;

        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for VisualizerTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
