//! Tests for building the gate from configuration

use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use imagine_gate::builders::{build_gate, build_gate_with_backend};
use imagine_gate::config::GateConfig;
use imagine_gate::core::{AuditSink, ComputeError, Image, ImageGenerator, InMemoryAuditSink};
use imagine_gate::infra::InMemoryBackend;
use imagine_gate::util::PermissionTier;

struct PixelGenerator;

#[async_trait]
impl ImageGenerator for PixelGenerator {
    async fn generate(&self, _positive: &str, _negative: &str) -> Result<Image, ComputeError> {
        Ok(Image::new(vec![0x89, b'P', b'N', b'G']))
    }
}

#[test]
fn test_build_gate_bootstraps_owner_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("whitelist.json");
    let cfg = GateConfig::new(11).with_whitelist_path(&path);

    let gate = build_gate(&cfg, PixelGenerator, None).unwrap();
    assert!(gate.store.can_invoke(11));
    assert_eq!(gate.page_size, 10);

    let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        on_disk,
        serde_json::json!([{ "actor_id": 11, "tier": 3, "granted_by": 11, "granted_at": 0.0 }])
    );
}

#[test]
fn test_build_gate_refuses_corrupt_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("whitelist.json");
    fs::write(&path, "[{\"actor_id\": 1, \"tier\": 9").unwrap();
    let cfg = GateConfig::new(1).with_whitelist_path(&path);

    let err = build_gate(&cfg, PixelGenerator, None).err().unwrap();
    assert!(format!("{err:#}").contains("corrupt"));
    // The document is left as found.
    assert_eq!(fs::read_to_string(&path).unwrap(), "[{\"actor_id\": 1, \"tier\": 9");
}

#[test]
fn test_build_gate_rejects_invalid_config() {
    let cfg = GateConfig::new(0);
    assert!(build_gate_with_backend(&cfg, InMemoryBackend::new(), PixelGenerator, None).is_err());
}

#[tokio::test]
async fn test_build_gate_wires_audit_into_both_components() {
    let sink = Arc::new(InMemoryAuditSink::new(64));
    let cfg = GateConfig::new(1).with_warmup(true);
    let audit: Arc<dyn AuditSink> = sink.clone();
    let gate =
        build_gate_with_backend(&cfg, InMemoryBackend::new(), PixelGenerator, Some(audit)).unwrap();

    gate.store.add(2, PermissionTier::User, 1, 10.0).unwrap();
    gate.warm_up_if_enabled().await;

    assert_eq!(sink.events_for("add").len(), 1);
    assert_eq!(sink.events_for("queued").len(), 1);
    assert_eq!(sink.events_for("completed").len(), 1);
}
