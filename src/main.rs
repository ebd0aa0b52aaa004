//! CLI for robobridge
//!
//! Subcommands:
//! - `server`: run the relay
//! - `device`: connect as a TCP device and send one message (smoke test)
//! - `dashboard`: connect as a WebSocket dashboard and send one frame (smoke test)

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{Level, error, info};

use robobridge::Relay;
use robobridge::config::load_config_from;

/// How long the smoke-test clients wait for something to come back.
const REPLY_WAIT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "robobridge")]
enum Command {
    /// Start the TCP and WebSocket listeners
    Server {
        /// Configuration file (default: config/default.*, if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the device (TCP) port
        #[arg(long)]
        stream_port: Option<u16>,
        /// Override the dashboard (WebSocket) port
        #[arg(long)]
        frame_port: Option<u16>,
    },
    /// Connect as a device, send a message and print the first reply
    Device {
        #[arg(long, default_value = "127.0.0.1:9000")]
        addr: String,
        #[arg(long)]
        send: Option<String>,
    },
    /// Connect as a dashboard, send a frame and print the first reply
    Dashboard {
        #[arg(long, default_value = "ws://127.0.0.1:8000")]
        url: String,
        #[arg(long)]
        send: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cmd = Command::parse();

    let result = match cmd {
        Command::Server {
            config,
            stream_port,
            frame_port,
        } => run_server(config, stream_port, frame_port).await,
        Command::Device { addr, send } => {
            robobridge::utils::logging::init_at(Level::INFO);
            run_device(&addr, send.as_deref()).await
        }
        Command::Dashboard { url, send } => {
            robobridge::utils::logging::init_at(Level::INFO);
            run_dashboard(&url, send.as_deref()).await
        }
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run_server(
    config: Option<PathBuf>,
    stream_port: Option<u16>,
    frame_port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = match load_config_from(config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            robobridge::utils::logging::init_at(Level::INFO);
            return Err(e.into());
        }
    };
    if let Some(port) = stream_port {
        settings.server.stream_port = port;
    }
    if let Some(port) = frame_port {
        settings.server.frame_port = port;
    }

    robobridge::utils::logging::init(&settings.log);

    // Either port failing to bind ends the process.
    let relay = Relay::bind(&settings).await?;

    tokio::select! {
        _ = relay.run() => {
            error!("Relay exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_device(addr: &str, send: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect(addr).await?;
    info!("Connected to {addr}");

    if let Some(text) = send {
        stream.write_all(text.as_bytes()).await?;
    }

    let mut buf = vec![0u8; 8192];
    match tokio::time::timeout(REPLY_WAIT, stream.read(&mut buf)).await {
        Ok(Ok(0)) => println!("Connection closed"),
        Ok(Ok(n)) => println!("Incoming: {}", String::from_utf8_lossy(&buf[..n])),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => println!("Nothing received"),
    }

    Ok(())
}

async fn run_dashboard(url: &str, send: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let (mut ws_stream, _response) = connect_async(url).await?;
    info!("Connected to {url}");

    if let Some(text) = send {
        ws_stream.send(WsMessage::text(text.to_owned())).await?;
    }

    match tokio::time::timeout(REPLY_WAIT, ws_stream.next()).await {
        Ok(Some(Ok(msg))) if msg.is_text() || msg.is_binary() => {
            println!("Incoming: {}", String::from_utf8_lossy(&msg.into_data()));
        }
        Ok(Some(Ok(_))) | Ok(None) => println!("Connection closed"),
        Ok(Some(Err(e))) => return Err(e.into()),
        Err(_) => println!("Nothing received"),
    }

    Ok(())
}
