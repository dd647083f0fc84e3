//! CLI for chathub
//!
//! Subcommands:
//! - `serve`: run the WebSocket and line-stream listeners
//! - `client`: send one message over WebSocket and print the first frame
//!   received (useful for smoke tests)

use std::sync::Arc;

use chathub::config::load_config;
use chathub::identity::{MemoryIdentityStore, SessionStore};
use chathub::server::Server;
use chathub::utils::logging;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chathub")]
enum Command {
    /// Start the hub with both listeners
    Serve {
        /// Overrides `log.level` from the configuration
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Run the example client (connects, sends one message, prints the reply)
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws/")]
        url: String,
        /// Message body to send
        #[arg(long, default_value = "Hello from chathub")]
        message: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    match Command::parse() {
        Command::Serve { log_level } => {
            if let Err(e) = run_server(log_level).await {
                error!("Server failed: {}", e);
            }
        }
        Command::Client { url, message } => {
            logging::init("info");
            if let Err(e) = run_client(&url, &message).await {
                error!("Client failed: {}", e);
            }
        }
    }
}

async fn run_server(log_level: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init(log_level.as_deref().unwrap_or(&config.log.level));

    let identities = match &config.identity.users_file {
        Some(path) => {
            let store = MemoryIdentityStore::from_file(path)?;
            info!(users = store.len(), %path, "Loaded identities");
            store
        }
        None => MemoryIdentityStore::new(),
    };

    let server = Server::bind(config, Arc::new(identities), Arc::new(SessionStore::new())).await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await;

    Ok(())
}

async fn run_client(url: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;

    ws_stream.send(WsMessage::text(message)).await?;

    if let Some(Ok(WsMessage::Text(incoming))) = ws_stream.next().await {
        println!("Incoming: {incoming}");
    }

    ws_stream.close(None).await?;
    Ok(())
}
