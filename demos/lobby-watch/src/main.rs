//! Connects to a Battleship++ server and prints lobby and chat activity.
//!
//! ```text
//! lobby-watch <nickname> <port> [host]
//! ```
//!
//! Without a host the first server found by broadcast discovery is used.

use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;
use salvo::prelude::*;

const DISCOVERY_DEADLINE: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Watches the lobby of a Battleship++ server.
#[derive(Parser, Debug)]
#[command(name = "lobby-watch")]
struct Args {
    /// Nickname announced to the server.
    nickname: String,
    /// Game port of the server.
    port: u16,
    /// Server host. Found by broadcast discovery when omitted.
    host: Option<String>,
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

async fn discover_server() -> Result<IpAddr, Box<dyn std::error::Error>> {
    let mut service = DiscoveryService::bind(DiscoveryConfig::default()).await?;
    let mut found = service.subscribe();
    let handle = service.start();

    eprintln!("looking for servers on the local network...");
    let servers = tokio::time::timeout(DISCOVERY_DEADLINE, found.recv()).await;
    handle.stop().await;

    match servers {
        Ok(Some(servers)) => servers
            .first()
            .copied()
            .ok_or_else(|| "discovery reported an empty server set".into()),
        Ok(None) => Err("discovery stopped unexpectedly".into()),
        Err(_) => Err("no server answered the discovery broadcast".into()),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    salvo::telemetry::init_tracing();
    let args = Args::parse();

    let host = match args.host {
        Some(host) => host,
        None => discover_server().await?.to_string(),
    };

    let client = SalvoClient::builder().build();
    let mut lobby = client.subscribe_lobby().await?;
    let mut chat = client.subscribe_chat().await?;
    let mut errors = client.subscribe_errors().await?;

    client.connect(&host, args.port, &args.nickname).await?;
    eprintln!("connected to {host}:{} as {}", args.port, args.nickname);

    loop {
        tokio::select! {
            Some(snapshot) = lobby.recv() => {
                println!("lobby: {} players, {} games", snapshot.players.len(), snapshot.games.len());
                for game in &snapshot.games {
                    println!("  {game}");
                }
            }
            Some(message) = chat.recv() => {
                println!("[{}] {}", message.author, message.text);
            }
            Some(error) = errors.recv() => {
                tracing::warn!(%error, "session error");
                if matches!(error, SessionError::ConnectionLost(_)) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                client.disconnect().await?;
                break;
            }
        }
    }

    client.shutdown().await;
    Ok(())
}
