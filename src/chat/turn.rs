use anyhow::{Error, Result};
use async_trait::async_trait;
use futures_util::StreamExt;

use super::session::ChatSession;

/// The outbound message a turn writes its reply into. It is opened
/// empty before the remote call is made and ends either finalized or
/// holding an error string.
#[async_trait]
pub trait Reply: Send {
    async fn open(&mut self);
    async fn stream_token(&mut self, token: &str);
    async fn finalize(&mut self, content: &str);
    async fn set_error(&mut self, error: &str);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assembled assistant reply
    Completed(String),
    /// The error text shown to the user
    Failed(String),
}

impl ChatSession {
    /// Runs one turn of the conversation for `message`.
    ///
    /// The caller must not run two turns of the same session at once.
    /// The session store enforces this by locking the session for the
    /// whole turn.
    ///
    /// On failure the user's message stays in the transcript and no
    /// assistant message is added. Text already streamed to `reply` is
    /// not kept.
    pub async fn handle_message(&mut self, message: &str, reply: &mut dyn Reply) -> TurnOutcome {
        if self.transcript.ensure_system(&self.system_message) {
            tracing::debug!("Added system message to session {}", self.id);
        }
        self.transcript.push_user(message);

        reply.open().await;

        match self.stream_reply(reply).await {
            Ok(content) => {
                self.transcript.push_assistant(&content);
                reply.finalize(&content).await;
                TurnOutcome::Completed(content)
            }
            Err(e) => {
                tracing::error!(
                    "Chat turn failed for session {}: {}. Root cause: {}",
                    self.id,
                    e,
                    e.root_cause()
                );
                let error = format!("Error: {}", e);
                reply.set_error(&error).await;
                TurnOutcome::Failed(error)
            }
        }
    }

    async fn stream_reply(&self, reply: &mut dyn Reply) -> Result<String, Error> {
        let mut stream = self
            .client
            .create_stream(self.transcript.messages(), &self.model)
            .await?;

        let mut content = String::new();
        while let Some(fragment) = stream.next().await {
            if let Some(token) = fragment?.content.filter(|t| !t.is_empty()) {
                content.push_str(&token);
                reply.stream_token(&token).await;
            }
        }

        Ok(content)
    }
}
