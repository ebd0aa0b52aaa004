//! WebSocket listener for dashboards.
//!
//! Text and binary frames are relayed to devices with the WebSocket framing
//! stripped. Ping/pong is answered by tungstenite and close frames end the
//! connection; neither is relayed.

use std::net::SocketAddr;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::{WebSocketStream, accept_async_with_config};
use tracing::{debug, info, warn};
use tungstenite::protocol::{Message as WsMessage, WebSocketConfig};

use crate::broker::Payload;
use crate::client::{Connection, OutboundReceiver, TransportKind};
use crate::relay::RelayContext;
use crate::transport::{ACCEPT_BACKOFF, finish_writer, within};
use crate::utils::RelayError;

#[derive(Debug)]
pub struct FrameListener {
    listener: TcpListener,
    context: RelayContext,
}

impl FrameListener {
    pub async fn bind(addr: &str, context: RelayContext) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::bind(TransportKind::Frame, addr, e))?;

        info!("WebSocket server listening on ws://{}", listener.local_addr()?);
        Ok(Self { listener, context })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer)) => {
                    tokio::spawn(serve_dashboard(socket, peer, self.context.clone()));
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept frame connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

async fn serve_dashboard(socket: TcpStream, peer: SocketAddr, context: RelayContext) {
    let max_bytes = context.settings().max_frame_bytes;
    let config = WebSocketConfig::default()
        .max_message_size(Some(max_bytes))
        .max_frame_size(Some(max_bytes));

    let ws_stream = match accept_async_with_config(socket, Some(config)).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake error");
            return;
        }
    };

    let Some((connection, outbound)) = context.admit(TransportKind::Frame, peer) else {
        return;
    };

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let (stop_writer, stop) = oneshot::channel();
    let writer_task = tokio::spawn(write_loop(ws_sender, outbound, stop, connection.clone()));

    let idle = context.settings().idle_timeout();

    loop {
        let next = tokio::select! {
            _ = connection.closed() => {
                debug!(connection = %connection.id, "closing frame connection on request");
                break;
            }
            next = within(idle, ws_receiver.next()) => next,
        };

        match next {
            None => {
                info!(connection = %connection.id, "frame connection idle, closing");
                break;
            }
            Some(None) | Some(Some(Ok(WsMessage::Close(_)))) => break,
            Some(Some(Ok(message))) => {
                if let Some(payload) = Payload::from_ws(message) {
                    context.relay(&connection, payload);
                }
            }
            Some(Some(Err(e))) => {
                warn!(connection = %connection.id, error = %e, "frame read failed");
                break;
            }
        }
    }

    context.release(&connection);
    finish_writer(writer_task, stop_writer).await;
}

/// Drain the outbound queue into the socket until told to stop, then close
/// the sink. Closing flushes the reply to a peer's close frame, or starts
/// the closing handshake when the relay is the side hanging up.
async fn write_loop(
    mut ws_sender: SplitSink<WebSocketStream<TcpStream>, WsMessage>,
    mut outbound: OutboundReceiver,
    mut stop: oneshot::Receiver<()>,
    connection: Connection,
) {
    loop {
        let payload = tokio::select! {
            biased;
            _ = &mut stop => break,
            payload = outbound.recv() => payload,
        };
        let Some(payload) = payload else { break };

        if let Err(e) = ws_sender.send(payload.into_ws()).await {
            warn!(connection = %connection.id, error = %e, "frame write failed");
            connection.close();
            return;
        }
    }

    if let Err(e) = ws_sender.close().await {
        debug!(connection = %connection.id, error = %e, "frame close failed");
    }
}
