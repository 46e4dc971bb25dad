use anyhow::Result;
use gemchat::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
