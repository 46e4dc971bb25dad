use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

pub mod chat;
pub mod serve;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Run the chat server and web widget
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Start a chat session in the terminal
    Chat {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

/// Loads variables from a `.env` file in the working directory if there
/// is one. Variables already set in the environment win.
fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    let Some(command) = args.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    load_dotenv()?;

    // A missing API key stops startup here, before any session exists
    let config = AppConfig::from_env()?;

    // Handle each sub command
    match command {
        Command::Serve { host, port } => {
            serve::run(host, port, config).await?;
        }
        Command::Chat {} => {
            chat::run(config).await?;
        }
    }

    Ok(())
}
