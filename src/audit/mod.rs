//! The `audit` module is the hook for record keeping outside the relay.
//!
//! The relay never stores messages itself. When auditing is enabled the
//! broadcast engine hands every message to an [`AuditSink`] before fan-out;
//! an implementation may log it, insert it into a database, or anything else
//! that does not block.

use std::fmt::Debug;

use tracing::info;

use crate::broker::message::{Payload, RelayedMessage};

/// Receives every relayed message. Called on the receiving connection's
/// task, so implementations must return quickly.
pub trait AuditSink: Send + Sync + Debug {
    fn record(&self, message: &RelayedMessage);
}

/// Emits one structured `tracing` event per relayed message.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

/// Text payloads longer than this are cut in the audit log.
const PREVIEW_CHARS: usize = 64;

impl AuditSink for TracingAudit {
    fn record(&self, message: &RelayedMessage) {
        info!(
            target: "robobridge::audit",
            origin = %message.origin,
            direction = message.direction.as_str(),
            bytes = message.payload.len(),
            received_at = %message.received_at.to_rfc3339(),
            preview = %preview(&message.payload),
            "relayed message"
        );
    }
}

fn preview(payload: &Payload) -> String {
    match payload {
        Payload::Text(text) => text.chars().take(PREVIEW_CHARS).collect(),
        Payload::Binary(bytes) => String::from_utf8_lossy(bytes)
            .chars()
            .take(PREVIEW_CHARS)
            .collect(),
    }
}
