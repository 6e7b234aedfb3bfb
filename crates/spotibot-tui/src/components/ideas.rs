//! Ideas panel: example prompts. Clicking one copies it into the prompt.

use ratatui::crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::transcript::wrap_text,
    theme::{style_muted, style_secondary},
    widgets::pane_chrome::pane_chrome,
};

pub const IDEAS: &[&str] = &[
    "What were David Bowie's top tracks?",
    "What are some less popular, but influential Neil Young songs. Make a playlist called Deep Neil with those songs.",
    "What are all my playlists?",
    "Play my _______ playlist",
    "Play Outlandos D'Amour by the Police",
    "What tracks are on Communique by Dire Straits?",
    "What tracks are in my playlist ______?",
    "Pause (only works when the player on this device is active)",
    "Start (only works when the player on this device is active)",
    "Tell me about how Bowie and Lennon collaborated to write the song Fame.",
    "Give me a list of the best Chillwave songs since 2010. (after the list is returned, ask to add them to a new playlist)",
];

pub struct IdeasPanel {
    pub visible: bool,
    /// Row ranges of each idea from the last draw, relative to the inner area.
    rows: Vec<(u16, u16)>,
}

impl IdeasPanel {
    pub fn new() -> Self {
        Self {
            visible: true,
            rows: Vec::new(),
        }
    }

    /// The idea drawn on inner row `row`, if any.
    fn idea_at(&self, row: u16) -> Option<&'static str> {
        self.rows
            .iter()
            .position(|&(start, end)| row >= start && row < end)
            .and_then(|i| IDEAS.get(i).copied())
    }
}

impl Default for IdeasPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for IdeasPanel {
    fn id(&self) -> ComponentId {
        ComponentId::Ideas
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) || event.row <= area.y {
            return vec![];
        }
        match self.idea_at(event.row - area.y - 1) {
            Some(idea) => vec![Action::FillPrompt(idea.replace("_______", "").replace("______", ""))],
            None => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleIdeas = action {
            self.visible = !self.visible;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let block = pane_chrome("here are some ideas", Some("F3"), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.rows.clear();
        let mut lines: Vec<Line> = Vec::new();
        for idea in IDEAS {
            let start = lines.len() as u16;
            for (i, row) in wrap_text(idea, inner.width.saturating_sub(2) as usize)
                .into_iter()
                .enumerate()
            {
                let bullet = if i == 0 { "• " } else { "  " };
                lines.push(Line::from(vec![
                    Span::styled(bullet, style_muted()),
                    Span::styled(row, style_secondary()),
                ]));
            }
            self.rows.push((start, lines.len() as u16));
            lines.push(Line::default());
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_click_fills_prompt() {
        let mut panel = IdeasPanel::new();
        panel.rows = vec![(0, 1), (2, 5), (6, 7), (8, 9)];
        let state = AppState::new(true, String::new());
        let area = Rect::new(50, 10, 30, 20);

        let actions = panel.handle_mouse(click(55, 14), area, &state);
        assert!(matches!(
            actions.as_slice(),
            [Action::FillPrompt(text)] if text.starts_with("What are some less popular")
        ));

        let actions = panel.handle_mouse(click(55, 19), area, &state);
        assert!(matches!(
            actions.as_slice(),
            [Action::FillPrompt(text)] if text == "Play my  playlist"
        ));

        // Blank separator row and the border row do nothing.
        assert!(panel.handle_mouse(click(55, 12), area, &state).is_empty());
        assert!(panel.handle_mouse(click(55, 10), area, &state).is_empty());
    }
}
