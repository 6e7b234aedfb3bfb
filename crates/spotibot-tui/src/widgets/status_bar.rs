//! Status bar: bottom line with input mode, login state and keybindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MODE_BUSY, C_MODE_CHAT, C_MODE_LOGIN, C_MUTED};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    /// Logged in and idle; the prompt accepts text.
    Chat,
    /// A turn is running.
    Busy,
    /// No Spotify token yet.
    Login,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Chat => "CHAT",
            Self::Busy => "BUSY",
            Self::Login => "LOGIN",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Chat => C_MODE_CHAT,
            Self::Busy => C_MODE_BUSY,
            Self::Login => C_MODE_LOGIN,
        }
    }

    fn keys(self) -> &'static str {
        match self {
            Self::Chat => " Enter send  PgUp/PgDn scroll  ^Y copy reply  ^O log out  F1 help  F2 logs  F3 ideas  ^C quit",
            Self::Busy => " working…  PgUp/PgDn scroll  F1 help  F2 logs  ^C quit",
            Self::Login => " ^L log in to Spotify  F1 help  F2 logs  ^C quit",
        }
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(mode.keys(), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
