//! Telegraph key panel
//!
//! Draws the press-and-hold key together with the symbols keyed so far.
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use super::app::Indicators;
use crate::morse;

const KEY_IDLE_STYLE: Style = Style::new()
    .fg(Color::Green)
    .add_modifier(Modifier::BOLD);

const KEY_ACTIVE_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::LightRed)
    .add_modifier(Modifier::BOLD);

const KEY_MUTED_STYLE: Style = Style::new().fg(Color::DarkGray);

const PENDING_STYLE: Style = Style::new()
    .fg(Color::LightYellow)
    .add_modifier(Modifier::BOLD);

/// Width of the key itself, borders included.
const KEY_WIDTH: u16 = 20;

/// What the key panel shows.
pub struct KeyPanel<'a>
{
    /// Symbols keyed but not committed
    pub pending: &'a str,
    /// Mute and signal flags
    pub indicators: Indicators,
    /// Whether keyboard focus is on the key
    pub focused: bool,
    /// Whether Space/Enter key as well
    pub keyboard_keying: bool,
}

impl KeyPanel<'_>
{
    /// Renders the panel to the specified area.
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to render to
    /// * `area` - The area within the frame to render the panel
    ///
    /// # Returns
    ///
    /// The area of the key, for hit testing.
    pub fn render(&self, frame: &mut Frame, area: Rect) -> Rect
    {
        let [key_area, readout_area] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(KEY_WIDTH), Constraint::Min(0)])
            .areas(area);

        let (caption, style) = if self.indicators.contains(Indicators::MUTED)
        {
            ("MUTED", KEY_MUTED_STYLE)
        }
        else if self.indicators.contains(Indicators::SIGNAL)
        {
            ("TRANSMIT", KEY_ACTIVE_STYLE)
        }
        else
        {
            ("KEY", KEY_IDLE_STYLE)
        };

        let border_type = if self.focused
        {
            BorderType::Double
        }
        else
        {
            BorderType::Rounded
        };

        let key = Paragraph::new(vec![Line::from(""), Line::from(caption)])
            .alignment(Alignment::Center)
            .style(style)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(border_type),
            );
        frame.render_widget(key, key_area);

        let guess = if self.pending.is_empty()
        {
            String::new()
        }
        else
        {
            morse::char_for(self.pending)
                .unwrap_or(morse::UNKNOWN_CHAR)
                .to_string()
        };

        let hint = if self.keyboard_keying
        {
            "hold mouse on KEY, or Space/Enter while focused"
        }
        else
        {
            "hold mouse on KEY"
        };

        let readout = Paragraph::new(vec![
            Line::from(vec![
                Span::raw(" keying: "),
                Span::styled(self.pending.to_owned(), PENDING_STYLE),
            ]),
            Line::from(vec![
                Span::raw(" char:   "),
                Span::styled(guess, PENDING_STYLE),
            ]),
            Line::from(Span::styled(format!(" {hint}"), KEY_MUTED_STYLE)),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::new().fg(Color::Green))
                .title(" SIGNAL "),
        );
        frame.render_widget(readout, readout_area);

        key_area
    }
}
