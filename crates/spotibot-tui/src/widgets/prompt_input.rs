//! PromptInput: single-line chat input built on tui-input.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_input, style_muted, C_INPUT_BG};

pub const PLACEHOLDER: &str = "What do you want me to do?";

#[derive(Debug, PartialEq)]
pub enum PromptAction {
    /// Enter on non-blank text; the input is cleared.
    Submit(String),
    Changed,
    None,
}

pub struct PromptInput {
    input: Input,
    placeholder: String,
}

impl PromptInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            placeholder: placeholder.into(),
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Esc clears the line; Enter submits it unless it is blank.
    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        match key.code {
            KeyCode::Enter => {
                let text = self.input.value().trim().to_string();
                if text.is_empty() {
                    return PromptAction::None;
                }
                self.input = Input::default();
                PromptAction::Submit(text)
            }
            KeyCode::Esc => {
                if self.input.value().is_empty() {
                    return PromptAction::None;
                }
                self.input = Input::default();
                PromptAction::Changed
            }
            _ => match self.input.handle_event(&Event::Key(key)) {
                Some(_) => PromptAction::Changed,
                None => PromptAction::None,
            },
        }
    }

    /// Render into a one-row `area`. `disabled_hint` replaces the placeholder
    /// and hides the cursor while input is not accepted.
    pub fn draw(&self, frame: &mut Frame, area: Rect, disabled_hint: Option<&str>) {
        let width = area.width.saturating_sub(3) as usize;
        let scroll = self.input.visual_scroll(width);
        let value = self.text();

        let body = match disabled_hint {
            Some(hint) if value.is_empty() => Span::styled(format!("› {}", hint), style_muted()),
            None if value.is_empty() => {
                Span::styled(format!("› {}", self.placeholder), style_muted())
            }
            _ => Span::styled(
                format!("› {}", value.chars().skip(scroll).collect::<String>()),
                style_input(),
            ),
        };

        let paragraph = Paragraph::new(Line::from(body))
            .style(ratatui::style::Style::default().bg(C_INPUT_BG));
        frame.render_widget(paragraph, area);

        if disabled_hint.is_none() && area.width > 0 {
            let cursor_x = area.x + 2 + self.input.visual_cursor().saturating_sub(scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

impl Default for PromptInput {
    fn default() -> Self {
        Self::new(PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(input: &mut PromptInput, text: &str) {
        for c in text.chars() {
            input.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_enter_submits_trimmed_text_and_clears() {
        let mut input = PromptInput::default();
        type_text(&mut input, "  pause play ");
        assert_eq!(
            input.handle_key(key(KeyCode::Enter)),
            PromptAction::Submit("pause play".into())
        );
        assert_eq!(input.text(), "");
    }

    #[test]
    fn test_blank_enter_is_ignored() {
        let mut input = PromptInput::default();
        type_text(&mut input, "   ");
        assert_eq!(input.handle_key(key(KeyCode::Enter)), PromptAction::None);
    }

    #[test]
    fn test_esc_clears() {
        let mut input = PromptInput::default();
        input.set_value("What are all my playlists?");
        assert_eq!(input.handle_key(key(KeyCode::Esc)), PromptAction::Changed);
        assert_eq!(input.text(), "");
        assert_eq!(input.handle_key(key(KeyCode::Esc)), PromptAction::None);
    }

    #[test]
    fn test_backspace_edits() {
        let mut input = PromptInput::default();
        type_text(&mut input, "Bowiex");
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.text(), "Bowie");
    }
}
