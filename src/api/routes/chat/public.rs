//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::openai::Message;

#[derive(Deserialize, Serialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Deserialize, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    // Shown once when the chat opens
    pub welcome: String,
}

#[derive(Deserialize, Serialize)]
pub struct ChatTranscriptResponse {
    pub session_id: String,
    pub model: String,
    pub transcript: Vec<Message>,
}
