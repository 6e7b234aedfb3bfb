//! AppState: shared read-only data passed to all components during render/event.
//!
//! The App event-loop is the only thing that writes to AppState.

use spotibot_core::dispatcher::{Link, Reply};
use spotibot_core::TurnReport;

use crate::widgets::status_bar::InputMode;

/// Maximum WARN/ERROR lines kept for the log panel.
pub const MAX_LOG_LINES: usize = 500;

/// One block in the chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    User(String),
    Assistant(String),
    /// Fixed operation message; colored by the operation's success.
    Notice { text: String, success: bool },
    Listing { heading: String, items: Vec<Link> },
    /// Local UI information such as the login link.
    Info(String),
    Error(String),
}

impl Entry {
    /// Text put on the clipboard by "copy last reply".
    pub fn plain_text(&self) -> String {
        match self {
            Entry::User(t) | Entry::Assistant(t) | Entry::Info(t) | Entry::Error(t) => t.clone(),
            Entry::Notice { text, .. } => text.clone(),
            Entry::Listing { heading, items } => {
                let mut out = heading.clone();
                for item in items {
                    out.push('\n');
                    out.push_str(&format!("{}  {}", item.name, item.uri));
                }
                out
            }
        }
    }

    pub fn is_reply(&self) -> bool {
        !matches!(self, Entry::User(_) | Entry::Info(_))
    }
}

/// Transcript entries for one finished turn, in display order.
pub fn entries_from_report(report: &TurnReport) -> Vec<Entry> {
    let mut entries = Vec::new();
    if let Some(text) = &report.narration {
        entries.push(Entry::Assistant(text.clone()));
    }
    if let Some(outcome) = &report.outcome {
        for reply in &outcome.replies {
            entries.push(match reply {
                Reply::Text(text) => Entry::Notice {
                    text: text.clone(),
                    success: outcome.success,
                },
                Reply::Listing { heading, items, .. } => Entry::Listing {
                    heading: heading.clone(),
                    items: items.clone(),
                },
            });
        }
    }
    if let Some(error) = &report.error {
        entries.push(Entry::Error(error.clone()));
    }
    entries
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub transcript: Vec<Entry>,
    pub logged_in: bool,
    /// A turn is running; the prompt is disabled.
    pub busy: bool,
    /// WARN/ERROR lines forwarded from the tracing subscriber.
    pub tui_log_lines: Vec<String>,
    pub log_path: String,
}

impl AppState {
    pub fn new(logged_in: bool, log_path: String) -> Self {
        Self {
            transcript: Vec::new(),
            logged_in,
            busy: false,
            tui_log_lines: Vec::new(),
            log_path,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if !self.logged_in {
            InputMode::Login
        } else if self.busy {
            InputMode::Busy
        } else {
            InputMode::Chat
        }
    }

    pub fn push_log(&mut self, line: String) {
        self.tui_log_lines.push(line);
        if self.tui_log_lines.len() > MAX_LOG_LINES {
            let excess = self.tui_log_lines.len() - MAX_LOG_LINES;
            self.tui_log_lines.drain(..excess);
        }
    }

    /// Append a finished turn. A reset clears the transcript first; the
    /// narration that came with it is kept.
    pub fn apply_report(&mut self, report: &TurnReport) {
        if report.outcome.as_ref().is_some_and(|o| o.reset_history) {
            self.transcript.clear();
        }
        self.transcript.extend(entries_from_report(report));
    }

    pub fn last_reply(&self) -> Option<&Entry> {
        self.transcript.iter().rev().find(|e| e.is_reply())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotibot_core::dispatcher::Outcome;

    fn outcome(success: bool, replies: Vec<Reply>) -> Option<Outcome> {
        Some(Outcome {
            operation: "top_tracks",
            success,
            replies,
            reset_history: false,
        })
    }

    #[test]
    fn test_entries_keep_turn_order() {
        let report = TurnReport {
            narration: Some("Here you go.".into()),
            outcome: outcome(
                true,
                vec![Reply::Listing {
                    heading: "These are the top tracks for David Bowie:".into(),
                    items: vec![Link {
                        name: "Heroes".into(),
                        uri: "spotify:track:h1".into(),
                    }],
                    summary: String::new(),
                }],
            ),
            error: None,
        };
        let entries = entries_from_report(&report);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], Entry::Assistant("Here you go.".into()));
        assert_eq!(
            entries[1].plain_text(),
            "These are the top tracks for David Bowie:\nHeroes  spotify:track:h1"
        );
    }

    #[test]
    fn test_failed_outcome_marks_notices() {
        let report = TurnReport {
            outcome: outcome(false, vec![Reply::Text("nope".into())]),
            ..TurnReport::default()
        };
        assert_eq!(
            entries_from_report(&report),
            vec![Entry::Notice {
                text: "nope".into(),
                success: false
            }]
        );
    }

    #[test]
    fn test_reset_keeps_its_narration() {
        let mut state = AppState::new(true, String::new());
        state.transcript.push(Entry::User("play Heroes".into()));
        state.transcript.push(Entry::Assistant("Playing Heroes.".into()));

        let report = TurnReport {
            narration: Some("Starting over.".into()),
            outcome: Some(Outcome {
                operation: "reset",
                success: true,
                replies: Vec::new(),
                reset_history: true,
            }),
            error: None,
        };
        state.apply_report(&report);
        assert_eq!(
            state.transcript,
            vec![Entry::Assistant("Starting over.".into())]
        );
    }

    #[test]
    fn test_apply_report_appends_without_reset() {
        let mut state = AppState::new(true, String::new());
        state.transcript.push(Entry::User("pause".into()));
        let report = TurnReport {
            outcome: outcome(true, vec![Reply::Text("Paused.".into())]),
            ..TurnReport::default()
        };
        state.apply_report(&report);
        assert_eq!(state.transcript.len(), 2);
    }

    #[test]
    fn test_last_reply_skips_user_and_info() {
        let mut state = AppState::new(true, String::new());
        state.transcript.push(Entry::Assistant("first".into()));
        state.transcript.push(Entry::User("again".into()));
        state.transcript.push(Entry::Info("login link".into()));
        assert_eq!(state.last_reply().map(|e| e.plain_text()).as_deref(), Some("first"));
    }

    #[test]
    fn test_log_lines_are_capped() {
        let mut state = AppState::new(false, String::new());
        for i in 0..MAX_LOG_LINES + 10 {
            state.push_log(format!("line {i}"));
        }
        assert_eq!(state.tui_log_lines.len(), MAX_LOG_LINES);
        assert_eq!(state.tui_log_lines[0], "line 10");
    }

    #[test]
    fn test_input_mode_follows_login_and_busy() {
        let mut state = AppState::new(false, String::new());
        assert_eq!(state.input_mode(), InputMode::Login);
        state.logged_in = true;
        assert_eq!(state.input_mode(), InputMode::Chat);
        state.busy = true;
        assert_eq!(state.input_mode(), InputMode::Busy);
    }
}
