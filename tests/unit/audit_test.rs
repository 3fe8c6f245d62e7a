//! Tests for audit sink

use imagine_gate::core::{build_audit_event, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    sink.record(build_audit_event("evt1", 1, Some(2), "add", "ok"));
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, "evt1");
    assert_eq!(events[0].actor, 1);
    assert_eq!(events[0].subject, Some(2));
    assert_eq!(events[0].action, "add");
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("evt1", 1, None, "queued", "ok"));
    sink.record(build_audit_event("evt2", 1, None, "completed", "ok"));
    sink.record(build_audit_event("evt3", 1, None, "queued", "ok"));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_id, "evt2"); // First one popped
    assert_eq!(events[1].event_id, "evt3");
    assert_eq!(sink.events_for("queued").len(), 1);
}
