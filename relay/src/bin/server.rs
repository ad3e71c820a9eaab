use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tetris_relay::Broker;
use tokio::net::TcpListener;

/// Pairing and relay server for two-player Tetris matches.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:9000")]
    listen: String,

    /// Seconds player1 waits for an opponent
    #[arg(long, default_value_t = 30)]
    wait_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("failed to listen on {}", args.listen))?;
    let broker = Arc::new(Broker::with_wait_timeout(Duration::from_secs(
        args.wait_timeout_secs,
    )));
    tracing::info!("tetris server listening on {}", args.listen);

    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        let broker = broker.clone();
        tokio::spawn(async move {
            let ws = match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    tracing::warn!("websocket handshake failed for {peer}: {e}");
                    return;
                }
            };
            // session errors never take the broker down
            if let Err(e) = broker.handle(ws).await {
                tracing::warn!("session for {peer} ended: {e}");
            }
        });
    }
}
