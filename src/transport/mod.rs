//! The `transport` module owns the two listening sockets.
//!
//! - `stream`: raw TCP for devices. Every chunk read is relayed as-is.
//! - `frame`: WebSocket for dashboards. Every text or binary frame is
//!   relayed with its framing removed.
//!
//! Both serve each accepted socket on its own task: a reader loop that
//! relays inbound data and a writer task that drains the connection's
//! outbound queue.

pub mod frame;
pub mod stream;

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub use frame::FrameListener;
pub use stream::StreamListener;

/// Pause after a failed `accept` so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// How long a writer task gets to flush and close its half of the socket
/// once the reader side has finished.
pub(crate) const WRITER_DRAIN: Duration = Duration::from_secs(1);

/// Await `fut`, giving up after `limit` when one is set. `None` means the
/// limit elapsed first.
pub(crate) async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Tell a writer task to stop and wait for it to close its half of the
/// socket. A writer stuck on a peer that no longer reads is aborted after
/// [`WRITER_DRAIN`].
pub(crate) async fn finish_writer(writer: JoinHandle<()>, stop: oneshot::Sender<()>) {
    let _ = stop.send(());
    let handle = writer.abort_handle();
    if tokio::time::timeout(WRITER_DRAIN, writer).await.is_err() {
        handle.abort();
    }
}
