//! Tests for configuration validation

use std::collections::HashMap;
use std::path::PathBuf;

use imagine_gate::config::{ConfigError, GateConfig, SerializerConfig};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_gate_config_defaults() {
    let cfg = GateConfig::new(42);
    assert_eq!(cfg.whitelist_path, PathBuf::from("whitelist.json"));
    assert!(cfg.warmup);
    assert_eq!(cfg.page_size, 10);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_gate_config_invalid_owner() {
    assert!(matches!(GateConfig::new(0).validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_gate_config_invalid_page_size() {
    let cfg = GateConfig::new(1).with_page_size(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_serializer_config_invalid_stack() {
    let cfg = SerializerConfig::new().with_thread_stack_size(1024);
    assert!(cfg.validate().is_err());
    let cfg = SerializerConfig::new().with_thread_name("  ");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_gate_config_from_json() {
    let json = r#"{
        "owner_id": 123456789012345678,
        "whitelist_path": "data/whitelist.json",
        "warmup": false,
        "serializer": { "thread_name": "sdxl" }
    }"#;

    let cfg = GateConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.owner_id, 123_456_789_012_345_678);
    assert_eq!(cfg.whitelist_path, PathBuf::from("data/whitelist.json"));
    assert!(!cfg.warmup);
    assert_eq!(cfg.page_size, 10);
    assert_eq!(cfg.serializer.thread_name, "sdxl");
    assert_eq!(
        cfg.serializer.thread_stack_size,
        SerializerConfig::default().thread_stack_size
    );
}

#[test]
fn test_gate_config_from_json_rejects_garbage() {
    assert!(matches!(
        GateConfig::from_json_str("{ owner_id: }"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_gate_config_from_lookup() {
    let cfg = GateConfig::from_lookup(lookup(&[
        ("IMAGINE_OWNER_ID", " 77 "),
        ("IMAGINE_WHITELIST_PATH", "/tmp/wl.json"),
        ("IMAGINE_NO_WARMUP", "yes"),
    ]))
    .unwrap();
    assert_eq!(cfg.owner_id, 77);
    assert_eq!(cfg.whitelist_path, PathBuf::from("/tmp/wl.json"));
    assert!(!cfg.warmup);
}

#[test]
fn test_gate_config_from_lookup_requires_owner() {
    assert!(GateConfig::from_lookup(lookup(&[])).is_err());
    assert!(matches!(
        GateConfig::from_lookup(lookup(&[("IMAGINE_OWNER_ID", "abc")])),
        Err(ConfigError::InvalidEnv { .. })
    ));
}

#[test]
fn test_gate_config_from_lookup_rejects_bad_flag() {
    assert!(matches!(
        GateConfig::from_lookup(lookup(&[
            ("IMAGINE_OWNER_ID", "5"),
            ("IMAGINE_NO_WARMUP", "maybe"),
        ])),
        Err(ConfigError::InvalidEnv { .. })
    ));
}
