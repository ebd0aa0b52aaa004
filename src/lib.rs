//! # robobridge
//!
//! `robobridge` relays traffic between field devices and dashboards. Devices
//! (robots, simulators) connect over raw TCP; dashboards connect over
//! WebSocket. Everything a device sends is broadcast to every dashboard, and
//! everything a dashboard sends is broadcast to every device. Payloads are
//! opaque and forwarded unmodified.
//!
//! ## Core Modules
//!
//! - `registry`: the live set of connections for one transport kind.
//! - `broker`: the broadcast engine and the payload types it moves.
//! - `transport`: the TCP and WebSocket listeners.
//! - `relay`: binds both listeners around a shared context.
//! - `client`: the per-connection handle and its outbound queue.
//! - `audit`: optional per-message hook for external record keeping.
//! - `config`: loading settings from file and environment.
//! - `utils`: error types and logging setup.

pub mod audit;
pub mod broker;
pub mod client;
pub mod config;
pub mod registry;
pub mod relay;
pub mod transport;
pub mod utils;

pub use relay::{Relay, RelayContext};
