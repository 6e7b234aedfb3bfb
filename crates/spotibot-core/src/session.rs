//! One chat session: history, model, dispatcher and retry policy together.
//!
//! There is no process-wide state; the UI owns a `Session` and drives it one
//! turn at a time.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::dispatcher::{Dispatcher, Outcome, Turn};
use crate::history::History;
use crate::openai::ChatModel;
use crate::retry::RetryPolicy;
use crate::schema::operation_schema;
use crate::spotify::SpotifyApi;

/// Everything a front-end needs to render one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    /// Free text from the model.
    pub narration: Option<String>,
    /// Result of the executed operation, if one ran.
    pub outcome: Option<Outcome>,
    /// Model call failed after all retries.
    pub error: Option<String>,
}

impl TurnReport {
    pub fn is_empty(&self) -> bool {
        self.narration.is_none() && self.outcome.is_none() && self.error.is_none()
    }
}

pub struct Session {
    history: History,
    dispatcher: Dispatcher,
    model: Arc<dyn ChatModel>,
    schema: Value,
    retry: RetryPolicy,
}

impl Session {
    pub fn new(model: Arc<dyn ChatModel>, spotify: Arc<dyn SpotifyApi>, retry: RetryPolicy) -> Self {
        Self {
            history: History::new(),
            dispatcher: Dispatcher::new(spotify),
            model,
            schema: operation_schema(),
            retry,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.reset();
    }

    /// Run one user turn.
    ///
    /// The model is called at most once per attempt. A function call is
    /// executed and its fixed message recorded; the model is not asked to
    /// narrate the result.
    pub async fn submit(&mut self, text: &str) -> TurnReport {
        self.history.push_user(text);

        let model = &self.model;
        let messages = self.history.messages();
        let schema = &self.schema;
        let result = self.retry.run(|| model.respond(messages, schema)).await;
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                error!("model call failed: {}", e);
                let message = format!("Unable to generate a response: {e}");
                self.history.push_system(message.clone());
                return TurnReport {
                    error: Some(message),
                    ..TurnReport::default()
                };
            }
        };

        let mut report = TurnReport::default();
        match Turn::new(reply.text, reply.call) {
            Turn::NoAction => debug!("model returned neither text nor a call"),
            Turn::Narrate(text) => {
                self.history.push_assistant(text.clone());
                report.narration = Some(text);
            }
            Turn::Execute { narration, call } => {
                if let Some(text) = narration {
                    self.history.push_assistant(text.clone());
                    report.narration = Some(text);
                }
                if let Some(outcome) = self.dispatcher.dispatch(&call).await {
                    if outcome.reset_history {
                        self.history.reset();
                    } else {
                        for reply in &outcome.replies {
                            self.history.push_system(reply.history_text());
                        }
                    }
                    report.outcome = Some(outcome);
                }
            }
        }
        report
    }
}
