//! Assemble the whitelist store and the job serializer from configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::GateConfig;
use crate::core::{
    AppResult, AuditSink, AuthorizationStore, ImageGenerator, JobSerializer, WhitelistBackend,
};
use crate::infra::JsonFileBackend;

/// The two admission components, shared by every request handler.
#[derive(Clone)]
pub struct Gate {
    /// Tiered whitelist.
    pub store: Arc<AuthorizationStore>,
    /// Single-flight compute gate.
    pub serializer: Arc<JobSerializer>,
    /// Entries per whitelist page.
    pub page_size: usize,
    /// Whether [`Gate::warm_up_if_enabled`] runs a job.
    pub warmup: bool,
}

impl Gate {
    /// Run the configured warm-up job. Failures are logged and swallowed.
    pub async fn warm_up_if_enabled(&self) {
        if self.warmup {
            let _ = self.serializer.warm_up().await;
        }
    }
}

/// Build the gate with the whitelist persisted at `cfg.whitelist_path`.
///
/// # Errors
///
/// Invalid configuration, a corrupt or unreadable whitelist document, or a
/// compute worker that cannot be started. A corrupt document is never
/// replaced.
pub fn build_gate<G: ImageGenerator>(
    cfg: &GateConfig,
    generator: G,
    audit: Option<Arc<dyn AuditSink>>,
) -> AppResult<Gate> {
    let backend = JsonFileBackend::new(&cfg.whitelist_path);
    build_gate_with_backend(cfg, backend, generator, audit)
        .with_context(|| format!("whitelist at {}", cfg.whitelist_path.display()))
}

/// Build the gate on top of an arbitrary whitelist backend.
///
/// # Errors
///
/// Same as [`build_gate`].
pub fn build_gate_with_backend<B, G>(
    cfg: &GateConfig,
    backend: B,
    generator: G,
    audit: Option<Arc<dyn AuditSink>>,
) -> AppResult<Gate>
where
    B: WhitelistBackend + 'static,
    G: ImageGenerator,
{
    cfg.validate().context("gate configuration invalid")?;

    let mut store = AuthorizationStore::open(backend, cfg.owner_id)
        .context("failed to initialize whitelist")?;
    let serializer = match audit {
        Some(sink) => {
            store = store.with_audit(Arc::clone(&sink));
            JobSerializer::with_audit(cfg.serializer.clone(), generator, sink)
        }
        None => JobSerializer::new(cfg.serializer.clone(), generator),
    }
    .context("failed to start job serializer")?;

    info!(
        owner = cfg.owner_id,
        whitelisted = store.len(),
        warmup = cfg.warmup,
        "gate ready"
    );

    Ok(Gate {
        store: Arc::new(store),
        serializer: Arc::new(serializer),
        page_size: cfg.page_size,
        warmup: cfg.warmup,
    })
}
