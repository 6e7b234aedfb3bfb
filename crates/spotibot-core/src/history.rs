//! Running message history for one chat session.

use serde::{Deserialize, Serialize};

/// Fixed behavioral preamble; always the first message of a history.
pub const SYSTEM_PREAMBLE: &str = "The user wants to control Spotify. \
Use the tools functions provided to get information from Spotify or take actions in Spotify. \
If the user asks you to take actions in Spotify, such as pause or start playback, do not just \
reply that you took the action--you should use the tools functions. If you are not certain what \
to do, or if you don't have all information needed to call a tools function, ask the user for \
clarification or more details. If the user asks general questions about music then answer those \
concisely. But don't answer questions that are not related to music.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Append-only within a session; `reset` drops everything but the preamble.
#[derive(Debug, Clone)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::new(Role::System, SYSTEM_PREAMBLE)],
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.push(Role::System, content);
    }

    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Everything after the preamble, i.e. what a user actually sees.
    pub fn visible(&self) -> &[Message] {
        &self.messages[1..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
