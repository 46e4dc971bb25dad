use std::sync::Arc;

use anyhow::{Error, Result};
use async_trait::async_trait;

use super::core::{FragmentStream, Message, completion_stream};

/// The remote side of a chat turn: submit the whole transcript and get
/// back the assistant's reply as a stream of fragments.
#[async_trait]
pub trait ChatCompletions {
    async fn create_stream(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<FragmentStream, Error>;
}

pub type SharedCompletions = Arc<dyn ChatCompletions + Send + Sync + 'static>;

/// Client for any endpoint that speaks the OpenAI chat completions
/// protocol, e.g. Gemini's OpenAI compatibility layer.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    api_base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_base_url: &str, api_key: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl ChatCompletions for OpenAiClient {
    async fn create_stream(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<FragmentStream, Error> {
        completion_stream(messages, &self.api_base_url, &self.api_key, model).await
    }
}
