//! The relay ties the two listeners to one shared `RelayContext`.
//!
//! `Relay::bind` binds both ports up front so a bind failure is reported
//! before any client is served; `Relay::run` then drives both accept loops
//! concurrently for the life of the process.

pub mod context;

use std::net::SocketAddr;

use tracing::info;

pub use context::RelayContext;

use crate::config::Settings;
use crate::transport::{FrameListener, StreamListener};
use crate::utils::RelayError;

#[derive(Debug)]
pub struct Relay {
    stream: StreamListener,
    frame: FrameListener,
    context: RelayContext,
}

impl Relay {
    pub async fn bind(settings: &Settings) -> Result<Self, RelayError> {
        let context = RelayContext::new(settings.relay.clone());
        Self::bind_with_context(settings, context).await
    }

    pub async fn bind_with_context(
        settings: &Settings,
        context: RelayContext,
    ) -> Result<Self, RelayError> {
        context.settings().validate()?;
        let stream = StreamListener::bind(&settings.server.stream_addr(), context.clone()).await?;
        let frame = FrameListener::bind(&settings.server.frame_addr(), context.clone()).await?;

        Ok(Self {
            stream,
            frame,
            context,
        })
    }

    pub fn stream_addr(&self) -> Result<SocketAddr, RelayError> {
        self.stream.local_addr()
    }

    pub fn frame_addr(&self) -> Result<SocketAddr, RelayError> {
        self.frame.local_addr()
    }

    pub fn context(&self) -> &RelayContext {
        &self.context
    }

    /// Serve both listeners. Never returns under normal operation.
    pub async fn run(self) {
        info!("relay running");
        tokio::join!(self.stream.run(), self.frame.run());
    }
}
