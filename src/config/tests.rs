use std::fs;

use serial_test::serial;
use tempfile::TempDir;

use super::settings::Settings;
use super::{OverflowPolicy, RelaySettings, load_config_from};
use crate::utils::RelayError;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.stream_port, 9000);
    assert_eq!(settings.server.frame_port, 8000);
    assert_eq!(settings.relay.max_connections, 1000);
    assert_eq!(settings.relay.outbound_queue_capacity, 0);
    assert_eq!(settings.relay.overflow_policy, OverflowPolicy::Drop);
    assert!(settings.relay.idle_timeout().is_none());
    assert!(!settings.relay.audit);
    assert_eq!(settings.log.level, "info");
}

#[test]
fn test_server_addresses() {
    let settings = Settings::default();
    assert_eq!(settings.server.stream_addr(), "0.0.0.0:9000");
    assert_eq!(settings.server.frame_addr(), "0.0.0.0:8000");
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("relay.toml");
    let toml = r#"
        [server]
        host = "127.0.0.1"
        stream_port = 9100

        [relay]
        outbound_queue_capacity = 64
        overflow_policy = "disconnect"
        idle_timeout_secs = 30
    "#;
    fs::write(&path, toml).expect("write config file");

    let cfg = load_config_from(Some(&path)).expect("load_config failed");
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.server.stream_port, 9100);
    // untouched keys keep their defaults
    assert_eq!(cfg.server.frame_port, 8000);
    assert_eq!(cfg.relay.outbound_queue_capacity, 64);
    assert_eq!(cfg.relay.overflow_policy, OverflowPolicy::Disconnect);
    assert_eq!(
        cfg.relay.idle_timeout(),
        Some(std::time::Duration::from_secs(30))
    );
    assert_eq!(cfg.relay.read_buffer_bytes, 8192);
}

#[test]
#[serial]
fn load_config_from_env_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("relay.toml");
    fs::write(&path, "[server]\nframe_port = 8100\n").expect("write config file");

    temp_env::with_vars(
        [
            ("ROBOBRIDGE_SERVER__FRAME_PORT", Some("8200")),
            ("ROBOBRIDGE_RELAY__AUDIT", Some("true")),
            ("ROBOBRIDGE_LOG__LEVEL", Some("debug")),
        ],
        || {
            let cfg = load_config_from(Some(&path)).expect("load_config failed");
            assert_eq!(cfg.server.frame_port, 8200);
            assert!(cfg.relay.audit);
            assert_eq!(cfg.log.level, "debug");
        },
    );
}

#[test]
#[serial]
fn missing_explicit_config_file_is_an_error() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("absent.toml");
    assert!(load_config_from(Some(&path)).is_err());
}

#[test]
#[serial]
fn invalid_overflow_policy_is_rejected() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("relay.toml");
    fs::write(&path, "[relay]\noverflow_policy = \"drop-oldest\"\n").expect("write config file");
    assert!(load_config_from(Some(&path)).is_err());
}

#[test]
#[serial]
fn zero_sizes_are_rejected_at_load() {
    let tmp = TempDir::new().expect("create tempdir");
    for key in ["max_frame_bytes", "read_buffer_bytes", "max_connections"] {
        let path = tmp.path().join(format!("{key}.toml"));
        fs::write(&path, format!("[relay]\n{key} = 0\n")).expect("write config file");

        match load_config_from(Some(&path)) {
            Err(RelayError::Config(e)) => assert!(e.to_string().contains(key), "{e}"),
            other => panic!("expected config error for {key}, got {other:?}"),
        }
    }
}

#[test]
#[serial]
fn oversized_queue_capacity_is_rejected_from_env() {
    let too_big = (tokio::sync::Semaphore::MAX_PERMITS as u64 + 1).to_string();
    temp_env::with_vars(
        [(
            "ROBOBRIDGE_RELAY__OUTBOUND_QUEUE_CAPACITY",
            Some(too_big.as_str()),
        )],
        || match load_config_from(None) {
            Err(RelayError::Config(e)) => {
                assert!(e.to_string().contains("outbound_queue_capacity"), "{e}")
            }
            other => panic!("expected config error, got {other:?}"),
        },
    );
}

#[test]
fn relay_settings_validation() {
    assert!(RelaySettings::default().validate().is_ok());

    let mut settings = RelaySettings::default();
    settings.outbound_queue_capacity = tokio::sync::Semaphore::MAX_PERMITS;
    assert!(settings.validate().is_ok());

    settings.outbound_queue_capacity = usize::MAX;
    assert!(settings.validate().is_err());

    let mut settings = RelaySettings::default();
    settings.max_frame_bytes = 0;
    assert!(settings.validate().is_err());
}
