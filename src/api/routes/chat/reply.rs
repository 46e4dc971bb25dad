//! Streams a chat turn's reply to the browser as server-sent events.
//!
//! Every turn produces an `open` event, zero or more `token` events and
//! then exactly one `done` or `error` event. Each event's data is a JSON
//! encoded string.

use async_trait::async_trait;
use axum::response::sse::Event;
use tokio::sync::mpsc;

use crate::chat::Reply;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyEvent {
    Open,
    Token(String),
    Done(String),
    Error(String),
}

impl ReplyEvent {
    /// Payloads are sent as JSON strings. Raw text could carry a `\r`
    /// that SSE readers treat as a line break.
    pub fn into_event(self) -> Result<Event, axum::Error> {
        match self {
            ReplyEvent::Open => Event::default().event("open").json_data(""),
            ReplyEvent::Token(token) => Event::default().event("token").json_data(token),
            ReplyEvent::Done(content) => Event::default().event("done").json_data(content),
            ReplyEvent::Error(error) => Event::default().event("error").json_data(error),
        }
    }
}

pub struct SseReply {
    tx: mpsc::UnboundedSender<ReplyEvent>,
}

impl SseReply {
    pub fn new(tx: mpsc::UnboundedSender<ReplyEvent>) -> Self {
        Self { tx }
    }

    // The browser may have gone away. The turn still runs to the end
    // so the transcript stays complete.
    fn send(&self, event: ReplyEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Reply receiver dropped, client disconnected");
        }
    }
}

#[async_trait]
impl Reply for SseReply {
    async fn open(&mut self) {
        self.send(ReplyEvent::Open);
    }

    async fn stream_token(&mut self, token: &str) {
        self.send(ReplyEvent::Token(token.to_string()));
    }

    async fn finalize(&mut self, content: &str) {
        self.send(ReplyEvent::Done(content.to_string()));
    }

    async fn set_error(&mut self, error: &str) {
        self.send(ReplyEvent::Error(error.to_string()));
    }
}
