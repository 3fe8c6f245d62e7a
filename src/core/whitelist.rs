//! Tiered whitelist: the admission gate in front of the job serializer.
//!
//! The store owns the full entry set. Every mutation takes the write mutex,
//! re-reads the acting and target entries, validates the tier hierarchy,
//! persists the complete new set through the backend and only then publishes
//! it to readers. A failed write leaves the in-memory set untouched.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{build_audit_event, AuditSink, StoreError, WhitelistError};
use crate::util::clock::now_ms;
use crate::util::serde::{ActorId, PermissionTier, UnixSeconds};

/// One whitelisted actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Whitelisted actor.
    #[serde(alias = "user_id")]
    pub actor_id: ActorId,
    /// Granted tier.
    #[serde(alias = "perms")]
    pub tier: PermissionTier,
    /// Actor that last granted or changed this entry.
    #[serde(alias = "by")]
    pub granted_by: ActorId,
    /// When the entry was last granted or changed.
    #[serde(alias = "date")]
    pub granted_at: UnixSeconds,
}

impl WhitelistEntry {
    /// Entry created for the owner when the store starts empty.
    #[must_use]
    pub const fn bootstrap(owner: ActorId) -> Self {
        Self {
            actor_id: owner,
            tier: PermissionTier::MAX,
            granted_by: owner,
            granted_at: 0.0,
        }
    }
}

/// Successful mutation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistOutcome {
    /// A new entry was created.
    Added,
    /// An entry was deleted.
    Removed,
    /// An entry's tier was replaced.
    PermsUpdated,
}

/// Storage abstraction for the persisted entry array.
///
/// Backends load and replace the whole document; there is no incremental
/// patching.
pub trait WhitelistBackend: Send + Sync {
    /// Load the persisted set, or `None` if no document exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] when a document exists but cannot be
    /// parsed, or [`StoreError::Io`] on read failure.
    fn load(&self) -> Result<Option<Vec<WhitelistEntry>>, StoreError>;

    /// Atomically replace the persisted set.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the document cannot be written.
    fn save(&self, entries: &[WhitelistEntry]) -> Result<(), StoreError>;
}

/// Persisted, hierarchy-enforcing permission table.
pub struct AuthorizationStore {
    entries: RwLock<Vec<WhitelistEntry>>,
    /// Serializes mutations against each other, including the disk write.
    write_lock: Mutex<()>,
    backend: Box<dyn WhitelistBackend>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl AuthorizationStore {
    /// Open the store, creating the bootstrap document if none exists.
    ///
    /// # Errors
    ///
    /// A document that exists but is unreadable, unparseable or lists an actor
    /// twice is reported as an error. It is never overwritten here.
    pub fn open(
        backend: impl WhitelistBackend + 'static,
        owner: ActorId,
    ) -> Result<Self, StoreError> {
        let entries = match backend.load()? {
            Some(entries) if !entries.is_empty() => {
                ensure_unique(&entries)?;
                info!(entries = entries.len(), "whitelist loaded");
                entries
            }
            _ => {
                let entries = vec![WhitelistEntry::bootstrap(owner)];
                backend.save(&entries)?;
                info!(owner = owner, "whitelist bootstrapped for owner");
                entries
            }
        };

        Ok(Self {
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
            backend: Box::new(backend),
            audit: None,
        })
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Whether `actor` may invoke the guarded operation.
    #[must_use]
    pub fn can_invoke(&self, actor: ActorId) -> bool {
        self.get(actor)
            .is_some_and(|e| e.tier >= PermissionTier::User)
    }

    /// Current entry for `actor`, if any.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<WhitelistEntry> {
        self.entries
            .read()
            .iter()
            .find(|e| e.actor_id == actor)
            .cloned()
    }

    /// Consistent copy of every entry, in storage order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<WhitelistEntry> {
        self.entries.read().clone()
    }

    /// Number of whitelisted actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whitelist `target` at `tier` on behalf of `acting`.
    ///
    /// # Errors
    ///
    /// `ActingUserNotFound`, `NotPermitted` (acting tier below 2 or below the
    /// requested tier), `AlreadyWhitelisted`, or `Persistence`.
    pub fn add(
        &self,
        target: ActorId,
        tier: PermissionTier,
        acting: ActorId,
        at: UnixSeconds,
    ) -> Result<WhitelistOutcome, WhitelistError> {
        let result = self.mutate(|entries| {
            let manager = find(entries, acting).ok_or(WhitelistError::ActingUserNotFound)?;
            if !manager.tier.can_manage() || tier > manager.tier {
                return Err(WhitelistError::NotPermitted);
            }
            if find(entries, target).is_some() {
                return Err(WhitelistError::AlreadyWhitelisted);
            }
            entries.push(WhitelistEntry {
                actor_id: target,
                tier,
                granted_by: acting,
                granted_at: at,
            });
            Ok(WhitelistOutcome::Added)
        });
        self.report("add", acting, target, &result);
        result
    }

    /// Remove `target` on behalf of `acting`.
    ///
    /// # Errors
    ///
    /// `ActingUserNotFound`, `NotWhitelisted`, `NotPermitted` (acting tier
    /// below 2 or below the target's tier), or `Persistence`.
    pub fn remove(
        &self,
        target: ActorId,
        acting: ActorId,
    ) -> Result<WhitelistOutcome, WhitelistError> {
        let result = self.mutate(|entries| {
            let manager = find(entries, acting).ok_or(WhitelistError::ActingUserNotFound)?;
            let user = find(entries, target).ok_or(WhitelistError::NotWhitelisted)?;
            if !manager.tier.can_manage() || manager.tier < user.tier {
                return Err(WhitelistError::NotPermitted);
            }
            entries.retain(|e| e.actor_id != target);
            Ok(WhitelistOutcome::Removed)
        });
        self.report("remove", acting, target, &result);
        result
    }

    /// Replace the tier of `target` on behalf of `acting`.
    ///
    /// # Errors
    ///
    /// `ActingUserNotFound`, `UserNotFound`, `NotPermitted` (acting tier below
    /// 2, below the target's current tier, or below the requested tier), or
    /// `Persistence`.
    pub fn update(
        &self,
        target: ActorId,
        tier: PermissionTier,
        acting: ActorId,
        at: UnixSeconds,
    ) -> Result<WhitelistOutcome, WhitelistError> {
        let result = self.mutate(|entries| {
            let manager = find(entries, acting).ok_or(WhitelistError::ActingUserNotFound)?;
            let user = find(entries, target).ok_or(WhitelistError::UserNotFound)?;
            if !manager.tier.can_manage() || manager.tier < user.tier || tier > manager.tier {
                return Err(WhitelistError::NotPermitted);
            }
            let manager_tier = manager.tier;
            let entry = entries
                .iter_mut()
                .find(|e| e.actor_id == target)
                .ok_or(WhitelistError::UserNotFound)?;
            entry.tier = tier;
            entry.granted_by = acting;
            entry.granted_at = at;
            debug!(target_actor = target, tier = %tier, acting_tier = %manager_tier, "tier replaced");
            Ok(WhitelistOutcome::PermsUpdated)
        });
        self.report("update", acting, target, &result);
        result
    }

    /// Run `op` against a working copy under the write mutex, persist the copy
    /// and publish it. Nothing is published if `op` or the write fails.
    fn mutate<F>(&self, op: F) -> Result<WhitelistOutcome, WhitelistError>
    where
        F: FnOnce(&mut Vec<WhitelistEntry>) -> Result<WhitelistOutcome, WhitelistError>,
    {
        let _guard = self.write_lock.lock();
        let mut working = self.entries.read().clone();
        let outcome = op(&mut working)?;
        self.backend.save(&working)?;
        *self.entries.write() = working;
        Ok(outcome)
    }

    fn report(
        &self,
        action: &str,
        acting: ActorId,
        target: ActorId,
        result: &Result<WhitelistOutcome, WhitelistError>,
    ) {
        let outcome = match result {
            Ok(outcome) => {
                info!(action, acting_actor = acting, target_actor = target, ?outcome, "whitelist changed");
                "ok".to_string()
            }
            Err(WhitelistError::Persistence(reason)) => {
                warn!(action, acting_actor = acting, target_actor = target, %reason, "whitelist write failed");
                "persistence".to_string()
            }
            Err(err) => {
                debug!(action, acting_actor = acting, target_actor = target, %err, "whitelist change rejected");
                err.to_string()
            }
        };
        if let Some(sink) = &self.audit {
            sink.record(build_audit_event(
                format!("{action}-{target}-{}", now_ms()),
                acting,
                Some(target),
                action,
                outcome,
            ));
        }
    }
}

fn find(entries: &[WhitelistEntry], actor: ActorId) -> Option<&WhitelistEntry> {
    entries.iter().find(|e| e.actor_id == actor)
}

fn ensure_unique(entries: &[WhitelistEntry]) -> Result<(), StoreError> {
    let mut seen = std::collections::HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.actor_id) {
            return Err(StoreError::DuplicateEntry(entry.actor_id));
        }
    }
    Ok(())
}
