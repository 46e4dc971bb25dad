use std::pin::Pin;

use anyhow::{Error, Result, bail};
use async_stream::try_stream;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const DONE_MARKER: &str = "[DONE]";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// One incremental piece of a streamed completion. A chunk may carry
/// no text at all (role-only or usage-only chunks).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamFragment {
    pub content: Option<String>,
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamFragment, Error>> + Send>>;

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChunkChoice>,
    error: Option<Value>,
}

/// Splits a server-sent event body into the `data` payloads of each
/// complete event. Bytes are held until a full line arrives so a
/// multi-byte character split across two network reads still decodes.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, Error> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = std::str::from_utf8(&line)?.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Flushes whatever is left once the body has ended. Some servers
    /// close the connection without the final blank line.
    pub fn finish(mut self) -> Result<Option<String>, Error> {
        if !self.buffer.is_empty() {
            let rest = String::from_utf8(std::mem::take(&mut self.buffer))?;
            if let Some(event) = self.process_line(rest.trim_end_matches('\r')) {
                return Ok(Some(event));
            }
        }
        Ok(self.process_line(""))
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let event = self.data.join("\n");
            self.data.clear();
            return Some(event);
        }

        // Comments and the `event`, `id` and `retry` fields are ignored
        if let Some(data) = line.strip_prefix("data:") {
            self.data
                .push(data.strip_prefix(' ').unwrap_or(data).to_string());
        }
        None
    }
}

fn error_message(error: &Value) -> String {
    error["message"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| error.to_string())
}

/// Parses the JSON payload of one `data:` event into a fragment.
pub fn parse_fragment(data: &str) -> Result<StreamFragment, Error> {
    let chunk = serde_json::from_str::<CompletionChunk>(data).inspect_err(|e| {
        tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e)
    })?;

    if let Some(error) = chunk.error {
        bail!("Completion stream returned an error: {}", error_message(&error));
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content);

    Ok(StreamFragment { content })
}

/// Turns a raw SSE response body into a lazy stream of fragments. The
/// stream ends at the `[DONE]` event or when the body ends, whichever
/// comes first.
pub fn fragments<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    Box::pin(try_stream! {
        let mut body = Box::pin(body);
        let mut decoder = SseDecoder::default();
        let mut done = false;

        'body: while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Error::from)?;
            for data in decoder.push(chunk.as_ref())? {
                if data == DONE_MARKER {
                    done = true;
                    break 'body;
                }
                yield parse_fragment(&data)?;
            }
        }

        if !done {
            if let Some(data) = decoder.finish()? {
                if data != DONE_MARKER {
                    yield parse_fragment(&data)?;
                }
            }
        }
    })
}

pub fn completions_url(api_base_url: &str) -> String {
    format!("{}/chat/completions", api_base_url.trim_end_matches('/'))
}

/// Requests a streamed chat completion. Resolves once the response
/// headers arrive; the body is consumed lazily through the returned
/// stream.
pub async fn completion_stream(
    messages: &[Message],
    api_base_url: &str,
    api_key: &str,
    model: &str,
) -> Result<FragmentStream, Error> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });
    let url = completions_url(api_base_url);
    tracing::debug!("Requesting streamed completion from {} using {}", url, model);

    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!(
            "Completion request failed with status {}: {}",
            status,
            body.trim()
        );
    }

    Ok(fragments(response.bytes_stream()))
}
