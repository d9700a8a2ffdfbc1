//! Application module for the Morse terminal.
//!
//! Holds the session state (both text buffers, the keyer, its timers and
//! the sidetone) and renders it. Every input handler takes the instant the
//! event happened, so the whole session can be driven from tests without a
//! terminal or a clock.
use std::time::Instant;

use bitflags::bitflags;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::{debug, info, warn};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use textwrap::wrap;

use super::key_panel::KeyPanel;
use crate::config::Settings;
use crate::keyer::{Deferred, Keyer};
use crate::morse::{self, Symbol};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::tone::ToneGenerator;

const FOCUSED_BORDER_STYLE: Style = Style::new().fg(Color::LightGreen);

const BORDER_STYLE: Style = Style::new().fg(Color::Green);

const OUTPUT_STYLE: Style = Style::new()
    .fg(Color::LightYellow)
    .add_modifier(Modifier::BOLD);

const BUTTON_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Green);

const BUTTON_ACTIVE_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::LightRed);

const CURSOR: &str = "█";

bitflags! {
    /// Session indicators shown in the status bar.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Indicators: u8
    {
        /// Key-down is ignored
        const MUTED = 1;
        /// The key is held and the tone sounding
        const SIGNAL = 1 << 1;
    }
}

/// Application mode that determines the current UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode
{
    /// Normal operating mode - default state
    Normal,
    /// Help overlay is displayed
    Help,
}

/// Which widget receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus
{
    /// Plaintext input pane
    Plaintext,
    /// Morse input pane
    Morse,
    /// The telegraph key
    Key,
}

impl Focus
{
    /// Next widget in tab order.
    #[must_use]
    pub const fn next(self) -> Self
    {
        match self
        {
            Self::Plaintext => Self::Morse,
            Self::Morse => Self::Key,
            Self::Key => Self::Plaintext,
        }
    }

    /// Previous widget in tab order.
    #[must_use]
    pub const fn previous(self) -> Self
    {
        match self
        {
            Self::Plaintext => Self::Key,
            Self::Morse => Self::Plaintext,
            Self::Key => Self::Morse,
        }
    }
}

/// The two text buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane
{
    /// Plaintext, shown with its Morse encoding
    Plaintext,
    /// Morse, shown with its decoding
    Morse,
}

/// Clickable controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control
{
    /// Copy the encoded plaintext
    CopyPlaintext,
    /// Clear the plaintext buffer
    ClearPlaintext,
    /// Copy the decoded Morse
    CopyMorse,
    /// Clear the Morse buffer
    ClearMorse,
    /// Toggle muting
    Mute,
    /// The telegraph key itself
    Key,
}

impl Control
{
    /// Button caption.
    const fn label(self) -> &'static str
    {
        match self
        {
            Self::CopyPlaintext | Self::CopyMorse => " COPY ",
            Self::ClearPlaintext | Self::ClearMorse => " CLEAR ",
            Self::Mute => " MUTE ",
            Self::Key => " KEY ",
        }
    }
}

/// Main application state for the Morse terminal.
pub struct App
{
    /// Plaintext typed by the user
    pub plain_input: String,
    /// Morse typed by the user or keyed in
    pub morse_input: String,
    /// Widget receiving keyboard input
    pub focus: Focus,
    /// Current application mode
    pub mode: AppMode,
    /// Flag indicating if the application should exit
    pub should_quit: bool,
    /// Mute and signal flags
    indicators: Indicators,
    /// Press-duration interpreter
    keyer: Keyer,
    /// Commit and teardown timers
    timers: Scheduler<Deferred>,
    /// Sidetone, opened on the first key-down
    tone: ToneGenerator,
    /// Pending tone teardown
    teardown: Option<TaskHandle>,
    /// Whether the terminal reports key releases
    keyboard_keying: bool,
    /// Last transient message for the status bar
    status: Option<String>,
    /// Screen areas of the clickable controls, from the last render
    hit_areas: Vec<(Control, Rect)>,
}

impl App
{
    /// Creates a new session.
    ///
    /// # Arguments
    ///
    /// * `settings` - Keyer timing and initial mute state
    /// * `tone` - The sidetone handle the session will own
    ///
    /// # Returns
    ///
    /// A new `App` with empty buffers and the plaintext pane focused
    #[must_use]
    pub fn new(settings: &Settings, tone: ToneGenerator) -> Self
    {
        let mut indicators = Indicators::empty();
        indicators.set(Indicators::MUTED, settings.start_muted);

        Self {
            plain_input: String::new(),
            morse_input: String::new(),
            focus: Focus::Plaintext,
            mode: AppMode::Normal,
            should_quit: false,
            indicators,
            keyer: Keyer::new(settings.keyer),
            timers: Scheduler::new(),
            tone,
            teardown: None,
            keyboard_keying: false,
            status: None,
            hit_areas: Vec::new(),
        }
    }

    /// Allows Space/Enter on the focused key to key.
    ///
    /// Only sensible when the terminal reports key releases.
    pub const fn enable_keyboard_keying(&mut self, enabled: bool)
    {
        self.keyboard_keying = enabled;
    }

    /// Whether the keyboard can key.
    #[must_use]
    pub const fn keyboard_keying(&self) -> bool
    {
        self.keyboard_keying
    }

    /// Current indicator flags.
    #[must_use]
    pub const fn indicators(&self) -> Indicators
    {
        self.indicators
    }

    /// Whether key-down is being ignored.
    #[must_use]
    pub const fn is_muted(&self) -> bool
    {
        self.indicators.contains(Indicators::MUTED)
    }

    /// Whether the key is down and signalling.
    #[must_use]
    pub const fn is_signal_active(&self) -> bool
    {
        self.indicators.contains(Indicators::SIGNAL)
    }

    /// Symbols keyed but not yet committed.
    #[must_use]
    pub fn pending_symbols(&self) -> &str
    {
        self.keyer.pending()
    }

    /// The sidetone handle.
    #[must_use]
    pub const fn tone(&self) -> &ToneGenerator
    {
        &self.tone
    }

    /// Last status message.
    #[must_use]
    pub fn status(&self) -> Option<&str>
    {
        self.status.as_deref()
    }

    /// The plaintext buffer encoded to Morse.
    #[must_use]
    pub fn plaintext_output(&self) -> String
    {
        morse::encode(&self.plain_input)
    }

    /// The Morse buffer decoded to text.
    #[must_use]
    pub fn morse_output(&self) -> String
    {
        morse::decode(&self.morse_input)
    }

    /// Moves keyboard focus forwards or backwards.
    pub const fn cycle_focus(&mut self, forward: bool)
    {
        self.focus = if forward
        {
            self.focus.next()
        }
        else
        {
            self.focus.previous()
        };
    }

    /// Types a character into the focused pane.
    pub fn insert_char(&mut self, ch: char)
    {
        match self.focus
        {
            Focus::Plaintext => self.plain_input.push(ch),
            Focus::Morse => self.morse_input.push(ch),
            Focus::Key =>
            {}
        }
    }

    /// Removes the last character of the focused pane.
    pub fn delete_char(&mut self)
    {
        match self.focus
        {
            Focus::Plaintext =>
            {
                self.plain_input.pop();
            }
            Focus::Morse =>
            {
                self.morse_input.pop();
            }
            Focus::Key =>
            {}
        }
    }

    /// Pane the focus belongs to, if any.
    #[must_use]
    pub const fn focused_pane(&self) -> Option<Pane>
    {
        match self.focus
        {
            Focus::Plaintext => Some(Pane::Plaintext),
            Focus::Morse => Some(Pane::Morse),
            Focus::Key => None,
        }
    }

    /// Empties a buffer.
    ///
    /// Symbols still being keyed are not affected.
    pub fn clear(&mut self, pane: Pane)
    {
        match pane
        {
            Pane::Plaintext => self.plain_input.clear(),
            Pane::Morse => self.morse_input.clear(),
        }
        self.status = Some("Cleared".to_owned());
    }

    /// Returns the transformed output of a pane for the clipboard.
    ///
    /// # Returns
    ///
    /// The encoded plaintext or the decoded Morse, or `None` when there is
    /// nothing to copy.
    pub fn copy_output(&mut self, pane: Pane) -> Option<String>
    {
        let output = match pane
        {
            Pane::Plaintext => self.plaintext_output(),
            Pane::Morse => self.morse_output(),
        };

        if output.is_empty()
        {
            self.status = Some("Nothing to copy".to_owned());
            return None;
        }

        self.status = Some("Copied to clipboard".to_owned());
        Some(output)
    }

    /// Toggles muting.
    pub fn toggle_mute(&mut self)
    {
        self.indicators.toggle(Indicators::MUTED);
        info!("Muted: {}", self.is_muted());
    }

    /// Toggles the help overlay.
    pub fn toggle_help(&mut self)
    {
        self.mode = if self.mode == AppMode::Help
        {
            AppMode::Normal
        }
        else
        {
            AppMode::Help
        };
    }

    /// Puts the key down.
    ///
    /// Ignored while muted. Otherwise the signal goes active, the tone
    /// (re)starts and any pending teardown of the previous tone is cancelled.
    ///
    /// # Returns
    ///
    /// `true` if the key actually went down.
    pub fn key_down(&mut self, now: Instant) -> bool
    {
        if self.is_muted()
        {
            debug!("Key-down ignored while muted");
            return false;
        }

        if !self.keyer.press(now, &mut self.timers)
        {
            return false;
        }

        if let Some(teardown) = self.teardown.take()
        {
            self.timers.cancel(teardown);
        }

        self.indicators.insert(Indicators::SIGNAL);
        self.tone.start();
        true
    }

    /// Lets the key up.
    ///
    /// # Returns
    ///
    /// The keyed symbol, or `None` if the key was not down.
    pub fn key_up(&mut self, now: Instant) -> Option<Symbol>
    {
        let symbol = self.keyer.release(now, &mut self.timers)?;

        self.indicators.remove(Indicators::SIGNAL);
        self.tone.release();

        if let Some(teardown) = self.teardown.take()
        {
            self.timers.cancel(teardown);
        }
        self.teardown = Some(self.timers.schedule(
            now,
            self.tone.config().teardown_delay,
            Deferred::ToneTeardown,
        ));

        Some(symbol)
    }

    /// The pointer left the key, or the terminal lost focus.
    ///
    /// Treated as a key-up so the signal can never stay stuck on.
    pub fn pointer_left(&mut self, now: Instant)
    {
        if self.keyer.is_pressed()
        {
            debug!("Pointer left the key while pressed");
            self.key_up(now);
        }
    }

    /// Runs every timer that is due.
    pub fn run_due(&mut self, now: Instant)
    {
        for task in self.timers.take_due(now)
        {
            match task
            {
                Deferred::CommitGroup =>
                {
                    if let Some(group) = self.keyer.commit()
                    {
                        self.commit_group(&group);
                    }
                }
                Deferred::ToneTeardown =>
                {
                    self.teardown = None;
                    self.tone.stop();
                }
            }
        }
    }

    /// Earliest instant a timer needs servicing.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant>
    {
        self.timers.next_deadline()
    }

    /// Appends a committed symbol group to the Morse buffer.
    fn commit_group(&mut self, group: &str)
    {
        if !self.morse_input.is_empty()
        {
            self.morse_input.push(' ');
        }
        self.morse_input.push_str(group);

        debug!(
            "Committed {group} ({})",
            morse::char_for(group).unwrap_or(morse::UNKNOWN_CHAR)
        );
    }

    /// Area a control occupied in the last render.
    #[must_use]
    pub fn control_area(&self, control: Control) -> Option<Rect>
    {
        self.hit_areas
            .iter()
            .find(|(candidate, _)| *candidate == control)
            .map(|(_, area)| *area)
    }

    /// Control under a screen position.
    fn control_at(&self, column: u16, row: u16) -> Option<Control>
    {
        let position = Position::new(column, row);

        self.hit_areas
            .iter()
            .find(|(_, area)| area.contains(position))
            .map(|(control, _)| *control)
    }

    /// Handles a mouse event.
    ///
    /// Pressing the left button on the key keys; releasing it anywhere, or
    /// dragging off the key, lets the key up.
    ///
    /// # Returns
    ///
    /// A button that was clicked and still needs handling.
    pub fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Option<Control>
    {
        match mouse.kind
        {
            // Controls sit under the help overlay
            MouseEventKind::Down(MouseButton::Left) if self.mode == AppMode::Help => None,
            MouseEventKind::Down(MouseButton::Left) =>
            {
                match self.control_at(mouse.column, mouse.row)?
                {
                    Control::Key =>
                    {
                        self.focus = Focus::Key;
                        self.key_down(now);
                        None
                    }
                    control => Some(control),
                }
            }
            MouseEventKind::Up(MouseButton::Left) =>
            {
                self.key_up(now);
                None
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved =>
            {
                if self.control_at(mouse.column, mouse.row) != Some(Control::Key)
                {
                    self.pointer_left(now);
                }
                None
            }
            _ => None,
        }
    }

    /// Runs a clicked button or its keyboard shortcut.
    ///
    /// # Returns
    ///
    /// Text to put on the clipboard, for the copy buttons.
    pub fn activate(&mut self, control: Control) -> Option<String>
    {
        match control
        {
            Control::CopyPlaintext => return self.copy_output(Pane::Plaintext),
            Control::CopyMorse => return self.copy_output(Pane::Morse),
            Control::ClearPlaintext => self.clear(Pane::Plaintext),
            Control::ClearMorse => self.clear(Pane::Morse),
            Control::Mute => self.toggle_mute(),
            // Keying goes through key_down/key_up
            Control::Key =>
            {}
        }
        None
    }

    /// Handles a keyboard event.
    ///
    /// Space and Enter key the telegraph key while it has focus and the
    /// terminal reports releases. A release of either always lets the key
    /// up, wherever focus moved in the meantime.
    ///
    /// # Arguments
    ///
    /// * `key` - The key event
    /// * `now` - When the event happened
    ///
    /// # Returns
    ///
    /// Text to put on the clipboard, if the event asked for a copy.
    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Option<String>
    {
        let is_key_code = matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter);
        let on_key = self.focus == Focus::Key && self.keyboard_keying;

        // Only the telegraph key cares about repeats and releases
        match key.kind
        {
            KeyEventKind::Release =>
            {
                if is_key_code && self.keyboard_keying
                {
                    self.key_up(now);
                }
                return None;
            }
            KeyEventKind::Repeat if on_key && is_key_code => return None,
            KeyEventKind::Press | KeyEventKind::Repeat =>
            {}
        }

        let ctrl = key
            .modifiers
            .contains(KeyModifiers::CONTROL);

        match (self.mode, key.code)
        {
            // Quit from anywhere
            (_, KeyCode::Char('q' | 'c')) if ctrl =>
            {
                self.should_quit = true;
            }

            // Help toggle
            (_, KeyCode::F(1)) | (AppMode::Help, KeyCode::Esc) =>
            {
                self.toggle_help();
            }
            (AppMode::Help, _) =>
            {}

            (AppMode::Normal, KeyCode::Char('t')) if ctrl =>
            {
                return self.activate(Control::Mute);
            }
            (AppMode::Normal, KeyCode::Char('y')) if ctrl =>
            {
                return self
                    .focused_pane()
                    .and_then(|pane| self.copy_output(pane));
            }
            (AppMode::Normal, KeyCode::Char('l')) if ctrl =>
            {
                if let Some(pane) = self.focused_pane()
                {
                    self.clear(pane);
                }
            }

            (AppMode::Normal, KeyCode::Tab) =>
            {
                self.cycle_focus(true);
            }
            (AppMode::Normal, KeyCode::BackTab) =>
            {
                self.cycle_focus(false);
            }

            // The telegraph key
            (AppMode::Normal, KeyCode::Char(' ') | KeyCode::Enter) if on_key =>
            {
                self.key_down(now);
            }
            (AppMode::Normal, KeyCode::Char(' ') | KeyCode::Enter) if self.focus == Focus::Key =>
            {
                warn!("Keyboard keying needs a terminal that reports key releases");
                self.status = Some("Key with the mouse in this terminal".to_owned());
            }

            // Text entry
            (AppMode::Normal, KeyCode::Backspace) =>
            {
                self.delete_char();
            }
            (AppMode::Normal, KeyCode::Char(ch)) if !ctrl =>
            {
                self.insert_char(ch);
            }

            _ =>
            {} // Ignore other key combinations
        }

        None
    }

    /// Renders the application UI to the provided frame.
    ///
    /// Also records where the clickable controls ended up.
    pub fn render(&mut self, frame: &mut Frame)
    {
        self.hit_areas.clear();

        let [panes, buttons, key, status] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),
                Constraint::Length(1),
                Constraint::Length(5),
                Constraint::Length(1),
            ])
            .areas(frame.area());

        let [plain_area, morse_area] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(panes);

        self.render_pane(frame, plain_area, Pane::Plaintext);
        self.render_pane(frame, morse_area, Pane::Morse);
        self.render_buttons(frame, buttons);

        let key_panel = KeyPanel {
            pending: self.keyer.pending(),
            indicators: self.indicators,
            focused: self.focus == Focus::Key,
            keyboard_keying: self.keyboard_keying,
        };
        let key_area = key_panel.render(frame, key);
        self.hit_areas.push((Control::Key, key_area));

        self.render_status(frame, status);

        if self.mode == AppMode::Help
        {
            Self::render_help(frame);
        }
    }

    /// Renders one input pane with its live transformation underneath.
    fn render_pane(&self, frame: &mut Frame, area: Rect, pane: Pane)
    {
        let (title, output_title, input, output, focused) = match pane
        {
            Pane::Plaintext => (
                " PLAINTEXT ",
                " ENCODED ",
                &self.plain_input,
                self.plaintext_output(),
                self.focus == Focus::Plaintext,
            ),
            Pane::Morse => (
                " MORSE ",
                " DECODED ",
                &self.morse_input,
                self.morse_output(),
                self.focus == Focus::Morse,
            ),
        };

        let border_style = if focused
        {
            FOCUSED_BORDER_STYLE
        }
        else
        {
            BORDER_STYLE
        };

        let [input_area, output_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(area);

        let mut typed = input.clone();
        if focused
        {
            typed.push_str(CURSOR);
        }

        let input_box = Paragraph::new(typed)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(title),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(input_box, input_area);

        // Wrap between tokens so a Morse character never splits across lines.
        // 2 for the borders
        let wrap_width = usize::from(output_area.width.saturating_sub(2)).max(1);
        let lines: Vec<Line> = wrap(&output, wrap_width)
            .into_iter()
            .map(|line| Line::styled(line.into_owned(), OUTPUT_STYLE))
            .collect();

        let output_box = Paragraph::new(Text::from(lines)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(BORDER_STYLE)
                .title(output_title),
        );
        frame.render_widget(output_box, output_area);
    }

    /// Renders the button bar and records each button's area.
    fn render_buttons(&mut self, frame: &mut Frame, area: Rect)
    {
        let controls = [
            Control::CopyPlaintext,
            Control::ClearPlaintext,
            Control::CopyMorse,
            Control::ClearMorse,
            Control::Mute,
        ];

        let mut column = area.x;
        let mut spans = Vec::with_capacity(controls.len() * 2);

        for control in controls
        {
            let label = control.label();
            let style = if control == Control::Mute && self.is_muted()
            {
                BUTTON_ACTIVE_STYLE
            }
            else
            {
                BUTTON_STYLE
            };

            let width = u16::try_from(label.len()).unwrap_or(u16::MAX);
            let button = Rect::new(column, area.y, width, 1).intersection(area);
            self.hit_areas.push((control, button));

            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
            column = column.saturating_add(width).saturating_add(1);
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Renders the status bar.
    fn render_status(&self, frame: &mut Frame, area: Rect)
    {
        let audio = match self.tone.is_available()
        {
            None => "audio: standby",
            Some(true) => "audio: on",
            Some(false) => "audio: off",
        };

        let mut spans = vec![
            Span::raw(" F1 help · Tab focus · ^Q quit │ "),
            Span::raw(audio),
        ];

        if let Some(status) = &self.status
        {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(status.clone(), OUTPUT_STYLE));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Renders the help overlay with keyboard shortcuts.
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to render the help overlay to
    fn render_help(frame: &mut Frame)
    {
        let area = centered_rect(60, 70, frame.area());

        // Clear the area first to make it fully opaque
        frame.render_widget(Clear, area);

        let text = Text::from(vec![
            Line::from("Tactical Morse Help:"),
            Line::from(""),
            Line::from("Hold the left mouse button on the KEY to transmit."),
            Line::from("Short presses are dots, long presses dashes."),
            Line::from("A pause commits the keyed character."),
            Line::from(""),
            Line::from("Tab/Shift+Tab: Move focus"),
            Line::from("Space/Enter on KEY: Key (terminals reporting key release)"),
            Line::from("Ctrl+Y: Copy output of focused pane"),
            Line::from("Ctrl+L: Clear focused pane"),
            Line::from("Ctrl+T: Toggle mute"),
            Line::from("Ctrl+Q or Ctrl+C: Quit"),
            Line::from("F1 or Esc: Close help"),
        ]);

        let help_box = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(FOCUSED_BORDER_STYLE)
                    .title(" Help "),
            )
            .wrap(Wrap { trim: true });

        frame.render_widget(help_box, area);
    }
}

/// Creates a centered rectangle inside the given area.
///
/// # Arguments
///
/// * `percent_x` - Width of the rectangle as a percentage of the parent area
/// * `percent_y` - Height of the rectangle as a percentage of the parent area
/// * `parent` - Parent rectangle
///
/// # Returns
///
/// A new rectangle positioned in the center of the parent
fn centered_rect(percent_x: u16, percent_y: u16, parent: Rect) -> Rect
{
    let [_, middle, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .areas(parent);

    let [_, center, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .areas(middle);

    center
}

#[cfg(test)]
mod tests
{
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::tone::{Recorder, ToneConfig};

    const fn ms(millis: u64) -> Duration
    {
        Duration::from_millis(millis)
    }

    fn app() -> App
    {
        let settings = Settings::default();
        App::new(&settings, ToneGenerator::disabled(settings.tone))
    }

    fn tap(app: &mut App, at: Instant, held: Duration)
    {
        app.key_down(at);
        app.key_up(at + held);
    }

    fn mouse(kind: MouseEventKind, area: Rect) -> MouseEvent
    {
        MouseEvent {
            kind,
            column: area.x,
            row: area.y,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent
    {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    fn ctrl(ch: char) -> KeyEvent
    {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn keyboard_app() -> App
    {
        let mut app = app();
        app.enable_keyboard_keying(true);
        app.focus = Focus::Key;
        app
    }

    fn rendered(mut app: App) -> App
    {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("test terminal");
        terminal
            .draw(|frame| app.render(frame))
            .expect("draw");
        app
    }

    #[test]
    fn press_durations_pick_symbols()
    {
        let start = Instant::now();
        let mut app = app();

        tap(&mut app, start, ms(150));
        assert_eq!(app.pending_symbols(), ".");

        tap(&mut app, start + ms(300), ms(250));
        assert_eq!(app.pending_symbols(), ".-");
    }

    #[test]
    fn close_presses_commit_as_one_group()
    {
        let start = Instant::now();
        let mut app = app();

        tap(&mut app, start, ms(100));
        tap(&mut app, start + ms(400), ms(300));
        app.run_due(start + ms(1200));
        assert_eq!(app.morse_input, "");

        app.run_due(start + ms(1300));
        assert_eq!(app.morse_input, ".-");
        assert_eq!(app.morse_output(), "A");
        assert_eq!(app.pending_symbols(), "");
    }

    #[test]
    fn separate_groups_are_space_separated()
    {
        let start = Instant::now();
        let mut app = app();

        for offset in [0, 250, 500]
        {
            tap(&mut app, start + ms(offset), ms(100));
        }
        app.run_due(start + ms(1300));

        for offset in [2000, 2400, 2800]
        {
            tap(&mut app, start + ms(offset), ms(300));
        }
        app.run_due(start + ms(4000));

        assert_eq!(app.morse_input, "... ---");
        assert_eq!(app.morse_output(), "SO");
    }

    #[test]
    fn commit_appends_after_typed_morse()
    {
        let start = Instant::now();
        let mut app = app();
        app.focus = Focus::Morse;
        for ch in "... ---".chars()
        {
            app.insert_char(ch);
        }

        tap(&mut app, start, ms(50));
        app.run_due(start + ms(700));

        assert_eq!(app.morse_input, "... --- .");
    }

    #[test]
    fn muted_key_down_is_ignored_but_buffer_survives()
    {
        let start = Instant::now();
        let mut app = app();

        tap(&mut app, start, ms(100));
        app.toggle_mute();

        assert!(!app.key_down(start + ms(200)));
        assert!(!app.is_signal_active());
        assert_eq!(app.key_up(start + ms(300)), None);

        app.run_due(start + ms(700));
        assert_eq!(app.morse_input, ".");
    }

    #[test]
    fn signal_follows_the_key()
    {
        let start = Instant::now();
        let mut app = app();

        assert!(app.key_down(start));
        assert!(app.is_signal_active());
        app.key_up(start + ms(100));
        assert!(!app.is_signal_active());
    }

    #[test]
    fn tone_is_torn_down_after_release()
    {
        let start = Instant::now();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let tone =
            ToneGenerator::with_output(ToneConfig::default(), Box::new(Recorder(Rc::clone(&calls))));
        let mut app = App::new(&Settings::default(), tone);

        tap(&mut app, start, ms(100));
        app.run_due(start + ms(140));
        assert!(app.tone().is_playing());

        app.run_due(start + ms(150));
        assert!(!app.tone().is_playing());
        assert_eq!(*calls.borrow(), ["start", "release", "stop"]);
    }

    #[test]
    fn new_press_cancels_pending_teardown()
    {
        let start = Instant::now();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let tone =
            ToneGenerator::with_output(ToneConfig::default(), Box::new(Recorder(Rc::clone(&calls))));
        let mut app = App::new(&Settings::default(), tone);

        tap(&mut app, start, ms(100));
        app.key_down(start + ms(120));
        app.run_due(start + ms(200));

        assert!(app.tone().is_playing());
        assert_eq!(*calls.borrow(), ["start", "release", "start"]);
    }

    #[test]
    fn focus_lost_releases_the_key()
    {
        let start = Instant::now();
        let mut app = app();

        app.key_down(start);
        app.pointer_left(start + ms(300));

        assert!(!app.is_signal_active());
        assert_eq!(app.pending_symbols(), "-");
    }

    #[test]
    fn mouse_keys_on_the_key_only()
    {
        let start = Instant::now();
        let mut app = rendered(app());
        let key = app.control_area(Control::Key).expect("key rendered");

        assert_eq!(app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), key), start), None);
        assert!(app.is_signal_active());
        assert_eq!(app.focus, Focus::Key);

        app.on_mouse(mouse(MouseEventKind::Up(MouseButton::Left), key), start + ms(120));
        assert_eq!(app.pending_symbols(), ".");
    }

    #[test]
    fn dragging_off_the_key_releases_it()
    {
        let start = Instant::now();
        let mut app = rendered(app());
        let key = app.control_area(Control::Key).expect("key rendered");
        let outside = Rect::new(0, 0, 1, 1);

        app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), key), start);
        app.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), key), start + ms(50));
        assert!(app.is_signal_active());

        app.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), outside), start + ms(260));
        assert!(!app.is_signal_active());
        assert_eq!(app.pending_symbols(), "-");
    }

    #[test]
    fn buttons_are_reported_to_the_caller()
    {
        let start = Instant::now();
        let mut app = rendered(app());
        let mute = app.control_area(Control::Mute).expect("mute rendered");

        assert_eq!(
            app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), mute), start),
            Some(Control::Mute)
        );
        assert!(!app.is_signal_active());
    }

    #[test]
    fn panes_show_live_transformations()
    {
        let mut app = app();
        for ch in "sos".chars()
        {
            app.insert_char(ch);
        }
        app.focus = Focus::Morse;
        for ch in "-.-. --- -- --".chars()
        {
            app.insert_char(ch);
        }

        assert_eq!(app.plaintext_output(), "... --- ...");
        assert_eq!(app.morse_output(), "COMM");
    }

    #[test]
    fn copy_returns_transformed_output()
    {
        let mut app = app();
        assert_eq!(app.copy_output(Pane::Plaintext), None);

        app.plain_input = "SOS".to_owned();
        app.morse_input = ".- !!!".to_owned();

        assert_eq!(app.copy_output(Pane::Plaintext).as_deref(), Some("... --- ..."));
        assert_eq!(app.copy_output(Pane::Morse).as_deref(), Some("A?"));
    }

    #[test]
    fn clear_keeps_pending_symbols()
    {
        let start = Instant::now();
        let mut app = app();
        app.morse_input = "...".to_owned();

        tap(&mut app, start, ms(100));
        app.clear(Pane::Morse);
        assert_eq!(app.morse_input, "");

        app.run_due(start + ms(700));
        assert_eq!(app.morse_input, ".");
    }

    #[test]
    fn focus_cycles_through_widgets()
    {
        let mut app = app();
        app.cycle_focus(true);
        assert_eq!(app.focus, Focus::Morse);
        app.cycle_focus(true);
        assert_eq!(app.focus, Focus::Key);
        app.insert_char('x');
        assert_eq!(app.plain_input, "");
        app.cycle_focus(false);
        app.cycle_focus(false);
        assert_eq!(app.focus, Focus::Plaintext);
    }

    #[test]
    fn space_keys_the_focused_key()
    {
        let start = Instant::now();
        let mut app = keyboard_app();

        app.on_key(key(KeyCode::Char(' '), KeyEventKind::Press), start);
        assert!(app.is_signal_active());
        app.on_key(key(KeyCode::Char(' '), KeyEventKind::Release), start + ms(300));

        assert!(!app.is_signal_active());
        assert_eq!(app.pending_symbols(), "-");
        assert_eq!(app.plain_input, "");
    }

    #[test]
    fn held_key_repeats_are_ignored()
    {
        let start = Instant::now();
        let mut app = keyboard_app();

        app.on_key(key(KeyCode::Enter, KeyEventKind::Press), start);
        app.on_key(key(KeyCode::Enter, KeyEventKind::Repeat), start + ms(50));
        app.on_key(key(KeyCode::Enter, KeyEventKind::Repeat), start + ms(100));
        app.on_key(key(KeyCode::Enter, KeyEventKind::Release), start + ms(120));

        assert_eq!(app.pending_symbols(), ".");
    }

    #[test]
    fn release_after_focus_moved_lets_the_key_up()
    {
        let start = Instant::now();
        let mut app = keyboard_app();

        app.on_key(key(KeyCode::Char(' '), KeyEventKind::Press), start);
        app.on_key(key(KeyCode::Tab, KeyEventKind::Press), start + ms(50));
        assert_eq!(app.focus, Focus::Plaintext);

        app.on_key(key(KeyCode::Char(' '), KeyEventKind::Release), start + ms(100));
        assert!(!app.is_signal_active());
        assert_eq!(app.pending_symbols(), ".");
    }

    #[test]
    fn space_types_when_the_key_is_not_focused()
    {
        let start = Instant::now();
        let mut app = app();
        app.enable_keyboard_keying(true);

        for ch in ['a', ' ', 'b']
        {
            app.on_key(key(KeyCode::Char(ch), KeyEventKind::Press), start);
            app.on_key(key(KeyCode::Char(ch), KeyEventKind::Release), start);
        }

        assert_eq!(app.plain_input, "a b");
        assert!(!app.is_signal_active());
        assert_eq!(app.pending_symbols(), "");
    }

    #[test]
    fn space_without_release_events_does_not_key()
    {
        let start = Instant::now();
        let mut app = app();
        app.focus = Focus::Key;

        app.on_key(key(KeyCode::Char(' '), KeyEventKind::Press), start);

        assert!(!app.is_signal_active());
        assert!(app.status().is_some());
    }

    #[test]
    fn shortcuts_mute_copy_clear_and_quit()
    {
        let start = Instant::now();
        let mut app = app();
        app.plain_input = "sos".to_owned();

        assert_eq!(app.on_key(ctrl('t'), start), None);
        assert!(app.is_muted());

        assert_eq!(app.on_key(ctrl('y'), start).as_deref(), Some("... --- ..."));

        app.on_key(ctrl('l'), start);
        assert_eq!(app.plain_input, "");

        assert!(!app.should_quit);
        app.on_key(ctrl('q'), start);
        assert!(app.should_quit);
    }

    #[test]
    fn help_swallows_keys_until_closed()
    {
        let start = Instant::now();
        let mut app = app();

        app.on_key(key(KeyCode::F(1), KeyEventKind::Press), start);
        assert_eq!(app.mode, AppMode::Help);

        app.on_key(key(KeyCode::Char('x'), KeyEventKind::Press), start);
        app.on_key(ctrl('t'), start);
        assert_eq!(app.plain_input, "");
        assert!(!app.is_muted());

        app.on_key(key(KeyCode::Esc, KeyEventKind::Press), start);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn clicks_under_help_do_nothing()
    {
        let start = Instant::now();
        let mut app = rendered(app());
        let mute = app.control_area(Control::Mute).expect("mute rendered");
        let key_area = app.control_area(Control::Key).expect("key rendered");
        app.toggle_help();

        assert_eq!(app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), mute), start), None);
        assert_eq!(
            app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), key_area), start),
            None
        );
        assert!(!app.is_signal_active());
        assert_eq!(app.focus, Focus::Plaintext);
    }

    #[test]
    fn activate_runs_buttons()
    {
        let mut app = app();
        app.morse_input = "... ---".to_owned();

        assert_eq!(app.activate(Control::CopyMorse).as_deref(), Some("SO"));
        assert_eq!(app.activate(Control::ClearMorse), None);
        assert_eq!(app.morse_input, "");
        app.activate(Control::Mute);
        assert!(app.is_muted());
    }
}
