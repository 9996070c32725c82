//! End-to-end session scenarios on the fake backend

use serde_json::json;
use std::time::Duration;
use tb_adapters::FakeRemoteClient;
use tb_core::test_support::generation_script;
use tb_core::{EntityId, FakeClock, JobKind, JobStatus, JobStatusReport, RemoteJobStatus};
use tb_engine::{timeout_diagnostic, Session, SessionConfig};

fn session(remote: &FakeRemoteClient) -> Session<FakeRemoteClient, FakeClock> {
    Session::with_clock(remote.clone(), FakeClock::new(), SessionConfig::default())
}

#[tokio::test(start_paused = true)]
async fn first_selection_without_saved_draft() {
    let remote = FakeRemoteClient::new();
    let session = session(&remote);
    let a = EntityId::new("a.cpp");

    session.select_entity(a.clone()).unwrap();
    let draft = session.wait_for_hydration(&a).await.unwrap();

    assert_eq!(draft.content, "");
    assert!(!draft.is_dirty);
}

#[tokio::test(start_paused = true)]
async fn edit_then_generate() {
    let remote = FakeRemoteClient::new();
    remote.script_next_job_reports(generation_script(2, "TEST(Gen, A) {}"));
    let session = session(&remote);
    let a = EntityId::new("a.cpp");

    session.select_entity(a.clone()).unwrap();
    session.wait_for_hydration(&a).await;
    session.edit_content(&a, "my edits").unwrap();
    assert!(session.get_draft(&a).unwrap().is_dirty);

    session.start_job(&a, JobKind::Generate, json!({})).await.unwrap();
    assert_eq!(session.wait_for_job(&a).await, Ok(JobStatus::Completed));

    let draft = session.get_draft(&a).unwrap();
    assert_eq!(draft.content, "TEST(Gen, A) {}");
    assert!(!draft.is_dirty);
    assert_eq!(draft.last_result.unwrap().status, RemoteJobStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn job_keeps_writing_to_its_entity_after_switch() {
    let remote = FakeRemoteClient::new();
    remote.script_next_job_reports(generation_script(3, "generated for A"));
    let session = session(&remote);
    let a = EntityId::new("a.cpp");
    let b = EntityId::new("b.cpp");

    session.select_entity(a.clone()).unwrap();
    session.wait_for_hydration(&a).await;
    session.start_job(&a, JobKind::Generate, json!({})).await.unwrap();
    session.select_entity(b.clone()).unwrap();
    session.wait_for_hydration(&b).await;

    assert_eq!(session.wait_for_job(&a).await, Ok(JobStatus::Completed));
    assert_eq!(session.get_draft(&a).unwrap().content, "generated for A");
    assert_eq!(session.get_draft(&b).unwrap().content, "");
    assert_eq!(session.selected(), Some(b));
}

#[tokio::test(start_paused = true)]
async fn superseded_job_never_writes() {
    let remote = FakeRemoteClient::new();
    let session = session(&remote);
    let a = EntityId::new("a.cpp");
    session.select_entity(a.clone()).unwrap();
    session.wait_for_hydration(&a).await;

    remote.script_next_job_reports(generation_script(5, "stale"));
    session.start_job(&a, JobKind::Generate, json!({})).await.unwrap();
    remote.script_next_job_reports(generation_script(1, "fresh"));
    session.start_job(&a, JobKind::Generate, json!({})).await.unwrap();

    assert_eq!(session.wait_for_job(&a).await, Ok(JobStatus::Completed));
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(session.get_draft(&a).unwrap().content, "fresh");
}

#[tokio::test(start_paused = true)]
async fn never_terminal_job_times_out() {
    let remote = FakeRemoteClient::new();
    remote.script_next_job_reports(vec![JobStatusReport::running()]);
    let session = session(&remote);
    let a = EntityId::new("a.cpp");
    session.select_entity(a.clone()).unwrap();
    session.wait_for_hydration(&a).await;

    session.start_job(&a, JobKind::Execute, json!({})).await.unwrap();
    assert_eq!(session.wait_for_job(&a).await, Ok(JobStatus::Timeout));

    let draft = session.get_draft(&a).unwrap();
    assert_eq!(draft.log_text, timeout_diagnostic(Duration::from_secs(300)));
    assert!(draft.last_result.is_none());
}
