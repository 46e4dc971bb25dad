use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use crate::chat::{ChatSession, Reply};
use crate::core::AppConfig;
use crate::openai::OpenAiClient;

/// Prints the reply to stdout as it streams in
struct TerminalReply;

#[async_trait]
impl Reply for TerminalReply {
    async fn open(&mut self) {}

    async fn stream_token(&mut self, token: &str) {
        print!("{}", token);
        let _ = std::io::stdout().flush();
    }

    async fn finalize(&mut self, _content: &str) {
        println!();
    }

    async fn set_error(&mut self, error: &str) {
        println!("\n{}", error);
    }
}

pub async fn run(config: AppConfig) -> Result<()> {
    // Logs go to stderr so they don't interleave with the reply
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=warn", env!("CARGO_CRATE_NAME")))
        }))
        .with_writer(std::io::stderr)
        .init();

    let mut rl = DefaultEditor::new()?;

    let client = Arc::new(OpenAiClient::new(&config.api_base_url, &config.api_key));
    let session_id = uuid::Uuid::new_v4().to_string();
    let mut session = ChatSession::start(
        &session_id,
        client,
        &config.model,
        &config.system_message,
    );

    println!("{}\n", config.welcome_message);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                session.handle_message(line, &mut TerminalReply).await;
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
