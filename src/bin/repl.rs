//! Local chat loop: one line in, one reply out.

use ledger_intake::{bootstrap::build_pipeline, config::AppConfig, InboundMessage, OwnerId};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    let owner = OwnerId(
        std::env::var("LEDGER_OWNER_ID")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1),
    );
    let pipeline = build_pipeline(&config)?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }
        if text == "/quit" || text == "/exit" {
            break;
        }

        let reply = pipeline.handle(&InboundMessage::new(owner, text)).await;
        stdout.write_all(format!("{}\n\n> ", reply).as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}
