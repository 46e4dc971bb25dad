use serde::Serialize;

use crate::openai::{Message, Role, SharedCompletions};

/// Ordered conversation history for one session.
///
/// The only way to add a `system` message is `ensure_system` which
/// puts it first and never adds a second one, so the transcript always
/// has at most one system message and it is always the first entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the system instruction at the front unless one is
    /// already present. Returns whether it was inserted.
    pub fn ensure_system(&mut self, instruction: &str) -> bool {
        if self.0.iter().any(|m| m.role == Role::System) {
            return false;
        }
        self.0.insert(0, Message::new(Role::System, instruction));
        true
    }

    pub fn push_user(&mut self, content: &str) {
        self.0.push(Message::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.0.push(Message::new(Role::Assistant, content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-session context: the transcript plus the client handle and
/// model used to continue it. Lives as long as the session does.
pub struct ChatSession {
    pub id: String,
    pub(super) transcript: Transcript,
    pub(super) client: SharedCompletions,
    pub(super) model: String,
    pub(super) system_message: String,
}

impl ChatSession {
    pub fn start(
        id: &str,
        client: SharedCompletions,
        model: &str,
        system_message: &str,
    ) -> Self {
        tracing::debug!("Starting chat session {} with model {}", id, model);
        Self {
            id: id.to_string(),
            transcript: Transcript::new(),
            client,
            model: model.to_string(),
            system_message: system_message.to_string(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}
