//! LogPanel component: recent warnings and errors.
//!
//! Hidden by default; F2 shows it under the chat. Full logs go to the log file.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ERROR, C_MUTED, C_SECONDARY},
    widgets::pane_chrome::pane_chrome_borders,
};

pub struct LogPanel {
    pub expanded: bool,
    pub scroll: usize,
    pub borders: Borders,
    /// Track last log count to detect new entries for auto-scroll.
    last_log_count: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            expanded: false,
            scroll: 0,
            borders: Borders::ALL,
            last_log_count: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
        if self.expanded {
            self.scroll = usize::MAX;
        }
    }
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for LogPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LogPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.expanded {
            return vec![];
        }
        match key.code {
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if !self.expanded {
            return vec![];
        }
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            MouseEventKind::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleLogs = action {
            self.toggle();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if area.height == 0 || !self.expanded {
            return;
        }
        frame.render_widget(Clear, area);

        let block = pane_chrome_borders("log", Some("F2"), focused, None, self.borders)
            .title_bottom(Line::from(Span::styled(
                format!(" {} ", state.log_path),
                Style::default().fg(C_MUTED),
            )));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let logs = &state.tui_log_lines;
        let height = inner.height as usize;
        let log_count = logs.len();

        // Follow new lines only while already at the bottom.
        if log_count > self.last_log_count {
            let max_scroll = log_count.saturating_sub(height);
            if self.scroll >= max_scroll.saturating_sub(1) {
                self.scroll = usize::MAX;
            }
            self.last_log_count = log_count;
        }

        if logs.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  no warnings so far",
                    Style::default().fg(C_MUTED),
                )),
                inner,
            );
            return;
        }

        let max_scroll = log_count.saturating_sub(height);
        self.scroll = self.scroll.min(max_scroll);

        let lines: Vec<Line> = logs
            .iter()
            .skip(self.scroll)
            .take(height)
            .map(|msg| {
                let color = if msg.contains(" ERROR ") { C_ERROR } else { C_SECONDARY };
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(msg.as_str(), Style::default().fg(color)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_jumps_to_bottom() {
        let mut panel = LogPanel::new();
        let state = AppState::new(false, String::new());
        panel.on_action(&Action::ToggleLogs, &state);
        assert!(panel.expanded);
        assert_eq!(panel.scroll, usize::MAX);
        panel.on_action(&Action::ToggleLogs, &state);
        assert!(!panel.expanded);
    }

    #[test]
    fn test_keys_ignored_while_hidden() {
        let mut panel = LogPanel::new();
        let state = AppState::new(false, String::new());
        let key = KeyEvent::new(KeyCode::Down, ratatui::crossterm::event::KeyModifiers::NONE);
        panel.handle_key(key, &state);
        assert_eq!(panel.scroll, 0);
    }
}
