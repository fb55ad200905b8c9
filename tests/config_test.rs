use chainnet::config::ClientConfig;
use std::time::Duration;

#[test]
fn test_full_document() {
    let json = r#"{
        "retry": { "max_retry": 3, "retry_interval_ms": 250, "state_ttl": "2h" },
        "cookie": {
            "enabled": true,
            "maximum_size": 500,
            "expire_after_write": "1h",
            "expire_after_access": "15m"
        },
        "header": { "enabled": true, "user_agent": "agent/1.0", "accept_language": "en-US" },
        "gzip": { "enabled": true },
        "transport": { "connect_timeout": "3s", "call_timeout": "30s", "max_idle_per_host": 8 }
    }"#;

    let config = ClientConfig::from_json_str(json).unwrap();

    assert_eq!(config.retry.max_retry, 3);
    assert_eq!(config.retry.retry_interval(), Duration::from_millis(250));
    assert_eq!(config.retry.state_ttl, Duration::from_secs(7200));
    assert_eq!(config.cookie.maximum_size, 500);
    assert_eq!(config.cookie.expire_after_access, Duration::from_secs(900));
    assert_eq!(config.header.user_agent.as_deref(), Some("agent/1.0"));
    assert_eq!(config.header.accept.as_deref(), Some("*/*"));
    assert!(config.gzip.enabled);
    assert_eq!(config.transport.call_timeout, Some(Duration::from_secs(30)));
    assert_eq!(config.transport.max_idle_per_host, 8);
}

#[test]
fn test_serialize_roundtrip_keeps_durations_readable() {
    let config = ClientConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""expire_after_write":"30m""#));

    let parsed = ClientConfig::from_json_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_empty_document_uses_defaults() {
    assert_eq!(ClientConfig::from_json_str("{}").unwrap(), ClientConfig::default());
}

#[test]
fn test_bad_duration_rejected() {
    assert!(ClientConfig::from_json_str(r#"{"retry": {"state_ttl": "soon"}}"#).is_err());
}
