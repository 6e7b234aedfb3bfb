//! Transcript component: the scrollable chat history.
//!
//! Lines are wrapped here rather than by `Paragraph` so the scroll offset can
//! be clamped against the real rendered height.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, Entry},
    component::Component,
    theme::{
        style_assistant, style_default, style_link, style_muted, style_notice, style_secondary,
        style_user, C_BADGE_ERR, C_BADGE_LIVE, C_BADGE_PENDING, C_ERROR,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

const USER_PREFIX: &str = "you › ";
const BOT_PREFIX: &str = "bot › ";

pub struct Transcript {
    /// Rows scrolled up from the bottom; 0 follows new output.
    from_bottom: usize,
    last_height: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            from_bottom: 0,
            last_height: 0,
        }
    }

    fn page(&self) -> usize {
        self.last_height.saturating_sub(1).max(1)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Transcript {
    fn id(&self) -> ComponentId {
        ComponentId::Transcript
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::PageUp => vec![Action::ScrollUp(self.page())],
            KeyCode::PageDown => vec![Action::ScrollDown(self.page())],
            KeyCode::Up => vec![Action::ScrollUp(1)],
            KeyCode::Down => vec![Action::ScrollDown(1)],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => vec![Action::ScrollUp(3)],
            MouseEventKind::ScrollDown => vec![Action::ScrollDown(3)],
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::ScrollUp(n) => self.from_bottom = self.from_bottom.saturating_add(*n),
            Action::ScrollDown(n) => self.from_bottom = self.from_bottom.saturating_sub(*n),
            Action::ScrollToBottom => self.from_bottom = 0,
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = if !state.logged_in {
            Badge { text: "LOGGED OUT", color: C_BADGE_ERR }
        } else if state.busy {
            Badge { text: "…", color: C_BADGE_PENDING }
        } else {
            Badge { text: "SPOTIFY", color: C_BADGE_LIVE }
        };
        let block = pane_chrome("chat", None, focused, Some(badge));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let width = inner.width as usize;
        let lines = if state.transcript.is_empty() {
            empty_lines(state, width)
        } else {
            render_entries(&state.transcript, width)
        };

        let height = inner.height as usize;
        self.last_height = height;
        let max_from_bottom = lines.len().saturating_sub(height);
        self.from_bottom = self.from_bottom.min(max_from_bottom);
        let start = max_from_bottom - self.from_bottom;

        let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();
        frame.render_widget(Paragraph::new(visible), inner);
    }
}

fn empty_lines(state: &AppState, width: usize) -> Vec<Line<'static>> {
    let hint = if state.logged_in {
        "Ask for music. Try one of the ideas on the right."
    } else {
        "Press Ctrl-L to log in to Spotify."
    };
    wrap_text(hint, width)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, style_muted())))
        .collect()
}

/// All transcript entries as display rows, one blank row between entries.
pub fn render_entries(entries: &[Entry], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        match entry {
            Entry::User(text) => prefixed(&mut lines, USER_PREFIX, style_user(), text, style_default(), width),
            Entry::Assistant(text) => {
                prefixed(&mut lines, BOT_PREFIX, style_assistant(), text, style_default(), width)
            }
            Entry::Notice { text, success } => {
                prefixed(&mut lines, BOT_PREFIX, style_assistant(), text, style_notice(*success), width)
            }
            Entry::Info(text) => plain(&mut lines, text, style_secondary(), width),
            Entry::Error(text) => plain(&mut lines, text, Style::default().fg(C_ERROR), width),
            Entry::Listing { heading, items } => {
                prefixed(&mut lines, BOT_PREFIX, style_assistant(), heading, style_default(), width);
                for item in items {
                    lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(item.name.clone(), style_default()),
                        Span::raw("  "),
                        Span::styled(item.uri.clone(), style_link()),
                    ]));
                }
            }
        }
    }
    lines
}

/// First row carries the prefix; continuation rows are indented to match.
fn prefixed(
    out: &mut Vec<Line<'static>>,
    prefix: &'static str,
    prefix_style: Style,
    text: &str,
    style: Style,
    width: usize,
) {
    let indent = prefix.width();
    let rows = wrap_text(text, width.saturating_sub(indent).max(1));
    for (i, row) in rows.into_iter().enumerate() {
        let lead = if i == 0 {
            Span::styled(prefix, prefix_style)
        } else {
            Span::raw(" ".repeat(indent))
        };
        out.push(Line::from(vec![lead, Span::styled(row, style)]));
    }
}

fn plain(out: &mut Vec<Line<'static>>, text: &str, style: Style, width: usize) {
    out.extend(
        wrap_text(text, width)
            .into_iter()
            .map(|row| Line::from(Span::styled(row, style))),
    );
}

/// Greedy word wrap by display width. Explicit newlines are kept and words
/// wider than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut row_width = 0;
        for word in paragraph.split_whitespace() {
            let word_width = word.width();
            let gap = usize::from(!row.is_empty());
            if row_width + gap + word_width <= width {
                if gap == 1 {
                    row.push(' ');
                }
                row.push_str(word);
                row_width += gap + word_width;
                continue;
            }
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            for c in word.chars() {
                let w = c.width().unwrap_or(0);
                if row_width + w > width && !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                }
                row.push(c);
                row_width += w;
            }
        }
        rows.push(row);
    }
    rows
}
