use std::sync::Arc;

use crate::chat::{ChatSession, SessionHandle, SessionStore};
use crate::core::AppConfig;
use crate::openai::{OpenAiClient, SharedCompletions};

pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionStore,
    // Client handle shared by every session
    pub completions: SharedCompletions,
}

impl AppState {
    pub fn new(config: AppConfig, completions: SharedCompletions) -> Self {
        Self {
            config,
            sessions: SessionStore::new(),
            completions,
        }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let completions = Arc::new(OpenAiClient::new(&config.api_base_url, &config.api_key));
        Self::new(config, completions)
    }

    /// Session start hook. Returns the new session's id.
    pub async fn start_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let session = ChatSession::start(
            &id,
            Arc::clone(&self.completions),
            &self.config.model,
            &self.config.system_message,
        );
        self.sessions.insert(session).await;
        id
    }

    /// Session end hook
    pub async fn end_session(&self, id: &str) -> bool {
        self.sessions.remove(id).await
    }

    pub async fn session(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).await
    }
}
