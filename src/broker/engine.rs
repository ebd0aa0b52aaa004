//! Broadcast engine
//!
//! Fans one received message out to every connection in a registry
//! snapshot. Each recipient gets exactly one enqueue attempt; a failure for
//! one recipient is logged and counted and never stops delivery to the rest.
//!
//! Enqueueing never waits on the network: the payload lands in the
//! recipient's outbound queue and that connection's writer task does the
//! actual I/O. Callers hold no lock while broadcasting since they pass a
//! snapshot, not the registry.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::audit::AuditSink;
use crate::broker::message::RelayedMessage;
use crate::client::Connection;

/// Outcome counts for one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone)]
pub struct Broadcaster {
    audit: Option<Arc<dyn AuditSink>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self { audit: None }
    }

    /// A broadcaster that reports every message to `audit` before fan-out.
    pub fn with_audit(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit: Some(audit) }
    }

    pub fn broadcast(&self, message: &RelayedMessage, targets: &[Connection]) -> BroadcastReport {
        if let Some(audit) = &self.audit {
            audit.record(message);
        }

        let mut report = BroadcastReport {
            attempted: targets.len(),
            ..BroadcastReport::default()
        };

        for target in targets {
            match target.deliver(message.payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        origin = %message.origin,
                        target = %target.id,
                        error = %e,
                        "failed to deliver message"
                    );
                }
            }
        }

        debug!(
            origin = %message.origin,
            direction = message.direction.as_str(),
            bytes = message.payload.len(),
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast message"
        );

        report
    }
}
