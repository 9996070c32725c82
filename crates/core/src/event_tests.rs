// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn event_entity_accessor() {
    let event = SessionEvent::JobFinished {
        entity: EntityId::new("a.cpp"),
        job: JobId::new("j1"),
        status: JobStatus::Completed,
    };
    assert_eq!(event.entity(), "a.cpp");
}

#[test]
fn event_display() {
    let event = SessionEvent::JobFinished {
        entity: EntityId::new("a.cpp"),
        job: JobId::new("j1"),
        status: JobStatus::Timeout,
    };
    assert_eq!(event.to_string(), "job:timeout a.cpp (j1)");
    let notice = SessionEvent::Notice { entity: EntityId::new("b.cpp"), message: "boom".into() };
    assert_eq!(notice.to_string(), "notice b.cpp: boom");
}

#[test]
fn event_serializes_with_type_tag() {
    let event = SessionEvent::DraftChanged { entity: EntityId::new("a.cpp") };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "draft_changed");
    assert_eq!(json["entity"], "a.cpp");
}
