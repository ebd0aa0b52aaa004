//! Raw TCP listener for devices and simulators.
//!
//! No framing is applied in either direction: whatever a single `read`
//! returns is broadcast to the dashboards as one binary payload, and
//! payloads from dashboards are written to the socket byte for byte.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::broker::Payload;
use crate::client::{Connection, OutboundReceiver, TransportKind};
use crate::relay::RelayContext;
use crate::transport::{ACCEPT_BACKOFF, finish_writer, within};
use crate::utils::RelayError;

#[derive(Debug)]
pub struct StreamListener {
    listener: TcpListener,
    context: RelayContext,
}

impl StreamListener {
    pub async fn bind(addr: &str, context: RelayContext) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::bind(TransportKind::Stream, addr, e))?;

        info!("Stream server listening on tcp://{}", listener.local_addr()?);
        Ok(Self { listener, context })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer)) => {
                    tokio::spawn(serve_device(socket, peer, self.context.clone()));
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept stream connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

async fn serve_device(socket: TcpStream, peer: SocketAddr, context: RelayContext) {
    let Some((connection, outbound)) = context.admit(TransportKind::Stream, peer) else {
        return;
    };

    if let Err(e) = socket.set_nodelay(true) {
        debug!(connection = %connection.id, error = %e, "could not set TCP_NODELAY");
    }

    let (mut reader, writer) = socket.into_split();
    let (stop_writer, stop) = oneshot::channel();
    let writer_task = tokio::spawn(write_loop(writer, outbound, stop, connection.clone()));

    let idle = context.settings().idle_timeout();
    let mut buf = vec![0u8; context.settings().read_buffer_bytes];

    loop {
        let read = tokio::select! {
            _ = connection.closed() => {
                debug!(connection = %connection.id, "closing stream connection on request");
                break;
            }
            read = within(idle, reader.read(&mut buf)) => read,
        };

        match read {
            None => {
                info!(connection = %connection.id, "stream connection idle, closing");
                break;
            }
            Some(Ok(0)) => break,
            Some(Ok(n)) => {
                context.relay(&connection, Payload::Binary(buf[..n].to_vec()));
            }
            Some(Err(e)) => {
                warn!(connection = %connection.id, error = %e, "stream read failed");
                break;
            }
        }
    }

    context.release(&connection);
    finish_writer(writer_task, stop_writer).await;
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
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

        if let Err(e) = writer.write_all(payload.as_bytes()).await {
            warn!(connection = %connection.id, error = %e, "stream write failed");
            connection.close();
            return;
        }
    }

    // FIN so the device sees end-of-stream
    let _ = writer.shutdown().await;
}
