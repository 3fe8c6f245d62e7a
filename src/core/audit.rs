//! Audit sink implementations.
//!
//! Whitelist mutations and job lifecycle transitions are recorded here when a
//! sink is attached. The in-memory sink keeps a bounded ring of recent events.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::util::clock::now_ms;
use crate::util::serde::ActorId;

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Actor that triggered the event.
    pub actor: ActorId,
    /// Actor the event is about, when different from `actor`.
    pub subject: Option<ActorId>,
    /// Action taken (add, remove, update, queued, completed, failed).
    pub action: String,
    /// Outcome label (`ok` or the rejection reason).
    pub outcome: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events whose action matches `action`.
    #[must_use]
    pub fn events_for(&self, action: &str) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    event_id: impl Into<String>,
    actor: ActorId,
    subject: Option<ActorId>,
    action: impl Into<String>,
    outcome: impl Into<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: event_id.into(),
        actor,
        subject,
        action: action.into(),
        outcome: outcome.into(),
        created_at_ms: now_ms(),
    }
}
