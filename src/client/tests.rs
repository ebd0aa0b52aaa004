use std::net::SocketAddr;

use super::{Connection, TransportKind};
use crate::broker::message::Payload;
use crate::config::{OverflowPolicy, RelaySettings};
use crate::utils::DeliveryError;

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn bounded(capacity: usize, policy: OverflowPolicy) -> RelaySettings {
    RelaySettings {
        outbound_queue_capacity: capacity,
        overflow_policy: policy,
        ..RelaySettings::default()
    }
}

#[test]
fn test_connection_new() {
    let (a, _) = Connection::new(TransportKind::Stream, peer(), &RelaySettings::default());
    let (b, _) = Connection::new(TransportKind::Stream, peer(), &RelaySettings::default());
    assert_eq!(a.kind, TransportKind::Stream);
    assert_eq!(a.peer, peer());
    assert_ne!(a.id, b.id);
    assert!(a.id.to_string().starts_with("conn-"));
}

#[test]
fn test_transport_kind_opposite() {
    assert_eq!(TransportKind::Stream.opposite(), TransportKind::Frame);
    assert_eq!(TransportKind::Frame.opposite(), TransportKind::Stream);
}

#[tokio::test]
async fn test_deliver_unbounded() {
    let (conn, mut rx) = Connection::new(TransportKind::Frame, peer(), &RelaySettings::default());
    conn.deliver(Payload::Text("hello".into())).unwrap();
    conn.deliver(Payload::Binary(vec![1, 2, 3])).unwrap();

    assert_eq!(rx.recv().await, Some(Payload::Text("hello".into())));
    assert_eq!(rx.recv().await, Some(Payload::Binary(vec![1, 2, 3])));
}

#[test]
fn test_deliver_to_closed_queue() {
    let (conn, rx) = Connection::new(TransportKind::Frame, peer(), &RelaySettings::default());
    drop(rx);
    assert_eq!(
        conn.deliver(Payload::Text("lost".into())),
        Err(DeliveryError::Closed)
    );
}

#[tokio::test]
async fn test_overflow_drop_keeps_connection() {
    let (conn, mut rx) = Connection::new(
        TransportKind::Stream,
        peer(),
        &bounded(1, OverflowPolicy::Drop),
    );
    conn.deliver(Payload::Binary(b"first".to_vec())).unwrap();
    assert_eq!(
        conn.deliver(Payload::Binary(b"second".to_vec())),
        Err(DeliveryError::Overflow {
            disconnected: false
        })
    );

    assert_eq!(rx.recv().await, Some(Payload::Binary(b"first".to_vec())));
    // room again after draining
    conn.deliver(Payload::Binary(b"third".to_vec())).unwrap();

    let closed = tokio::time::timeout(std::time::Duration::from_millis(50), conn.closed()).await;
    assert!(closed.is_err(), "drop policy must not close the connection");
}

#[tokio::test]
async fn test_overflow_disconnect_signals_shutdown() {
    let (conn, _rx) = Connection::new(
        TransportKind::Stream,
        peer(),
        &bounded(1, OverflowPolicy::Disconnect),
    );
    conn.deliver(Payload::Binary(b"first".to_vec())).unwrap();
    assert_eq!(
        conn.deliver(Payload::Binary(b"second".to_vec())),
        Err(DeliveryError::Overflow { disconnected: true })
    );

    tokio::time::timeout(std::time::Duration::from_secs(1), conn.closed())
        .await
        .expect("disconnect policy should signal shutdown");
}

#[tokio::test]
async fn test_close_is_seen_by_clone() {
    let (conn, _rx) = Connection::new(TransportKind::Frame, peer(), &RelaySettings::default());
    let other = conn.clone();
    conn.close();
    tokio::time::timeout(std::time::Duration::from_secs(1), other.closed())
        .await
        .expect("close should be latched for any clone");
}
