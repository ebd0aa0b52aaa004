use config::ConfigError;
use serde::Deserialize;
use tokio::sync::Semaphore;

/// Top-level configuration settings for the application.
///
/// Includes settings for the two listening ports, the relay behaviour and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Both listeners bind to `host`; devices connect on `stream_port` over raw
/// TCP and dashboards connect on `frame_port` over WebSocket.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub stream_port: u16,
    pub frame_port: u16,
}

impl ServerSettings {
    pub fn stream_addr(&self) -> String {
        format!("{}:{}", self.host, self.stream_port)
    }

    pub fn frame_addr(&self) -> String {
        format!("{}:{}", self.host, self.frame_port)
    }
}

/// What happens when a recipient's outbound queue is full.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Drop the message for that recipient and keep the connection.
    #[default]
    Drop,
    /// Tear the recipient's connection down.
    Disconnect,
}

/// Configuration settings for the relay.
///
/// `outbound_queue_capacity` and `idle_timeout_secs` use `0` to mean
/// "unbounded" and "never" respectively.
#[derive(Debug, Deserialize, Clone)]
pub struct RelaySettings {
    pub max_connections: usize,
    pub read_buffer_bytes: usize,
    pub max_frame_bytes: usize,
    pub outbound_queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
    pub idle_timeout_secs: u64,
    pub audit: bool,
}

impl RelaySettings {
    /// Reject values the listeners cannot run with. A bounded queue larger
    /// than tokio's semaphore limit would panic on every accept, and a zero
    /// frame or buffer size would tear every client down on its first read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(invalid("relay.max_connections", "must be at least 1"));
        }
        if self.read_buffer_bytes == 0 {
            return Err(invalid("relay.read_buffer_bytes", "must be at least 1"));
        }
        if self.max_frame_bytes == 0 {
            return Err(invalid("relay.max_frame_bytes", "must be at least 1"));
        }
        if self.outbound_queue_capacity > Semaphore::MAX_PERMITS {
            return Err(invalid(
                "relay.outbound_queue_capacity",
                &format!("must be at most {}", Semaphore::MAX_PERMITS),
            ));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Option<std::time::Duration> {
        (self.idle_timeout_secs > 0).then(|| std::time::Duration::from_secs(self.idle_timeout_secs))
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Message(format!("invalid {key}: {reason}"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub relay: Option<PartialRelaySettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub stream_port: Option<u16>,
    pub frame_port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRelaySettings {
    pub max_connections: Option<usize>,
    pub read_buffer_bytes: Option<usize>,
    pub max_frame_bytes: Option<usize>,
    pub outbound_queue_capacity: Option<usize>,
    pub overflow_policy: Option<OverflowPolicy>,
    pub idle_timeout_secs: Option<u64>,
    pub audit: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                stream_port: 9000,
                frame_port: 8000,
            },
            relay: RelaySettings::default(),
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            read_buffer_bytes: 8192,
            max_frame_bytes: 16 * 1024 * 1024,
            outbound_queue_capacity: 0,
            overflow_policy: OverflowPolicy::Drop,
            idle_timeout_secs: 0,
            audit: false,
        }
    }
}

impl PartialSettings {
    /// Fill every missing value from `Settings::default()`.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let server = self.server;
        let relay = self.relay;
        let log = self.log;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                stream_port: server
                    .as_ref()
                    .and_then(|s| s.stream_port)
                    .unwrap_or(default.server.stream_port),
                frame_port: server
                    .as_ref()
                    .and_then(|s| s.frame_port)
                    .unwrap_or(default.server.frame_port),
            },
            relay: RelaySettings {
                max_connections: relay
                    .as_ref()
                    .and_then(|r| r.max_connections)
                    .unwrap_or(default.relay.max_connections),
                read_buffer_bytes: relay
                    .as_ref()
                    .and_then(|r| r.read_buffer_bytes)
                    .unwrap_or(default.relay.read_buffer_bytes),
                max_frame_bytes: relay
                    .as_ref()
                    .and_then(|r| r.max_frame_bytes)
                    .unwrap_or(default.relay.max_frame_bytes),
                outbound_queue_capacity: relay
                    .as_ref()
                    .and_then(|r| r.outbound_queue_capacity)
                    .unwrap_or(default.relay.outbound_queue_capacity),
                overflow_policy: relay
                    .as_ref()
                    .and_then(|r| r.overflow_policy)
                    .unwrap_or(default.relay.overflow_policy),
                idle_timeout_secs: relay
                    .as_ref()
                    .and_then(|r| r.idle_timeout_secs)
                    .unwrap_or(default.relay.idle_timeout_secs),
                audit: relay
                    .as_ref()
                    .and_then(|r| r.audit)
                    .unwrap_or(default.relay.audit),
            },
            log: LogSettings {
                level: log
                    .and_then(|l| l.level)
                    .unwrap_or(default.log.level),
            },
        }
    }
}
