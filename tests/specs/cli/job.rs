//! `tb job` specs against a stub backend

use crate::prelude::*;

const START: &str = "POST /api/entities/a.cpp/jobs";
const STATUS: &str = "GET /api/jobs/j-1";

fn backend_with_job() -> StubBackend {
    let backend = StubBackend::start();
    backend.reply(START, 200, r#"{"job_id":"j-1"}"#);
    backend
}

#[test]
fn run_waits_for_completed_generation() {
    let backend = backend_with_job();
    backend
        .reply(STATUS, 200, r#"{"status":"queued"}"#)
        .reply(STATUS, 200, r#"{"status":"running","logs":"generating"}"#)
        .reply(STATUS, 200, r#"{"status":"completed","content":"TEST(A, Gen) {}"}"#);

    cli()
        .backend(&backend)
        .args(&["job", "run", "a.cpp"])
        .passes()
        .stdout_has("Job j-1 (generate a.cpp): completed")
        .stdout_has("TEST(A, Gen) {}");
}

#[test]
fn run_sends_kind_and_params() {
    let backend = backend_with_job();
    backend.reply(STATUS, 200, r#"{"status":"completed"}"#);

    cli()
        .backend(&backend)
        .args(&["job", "run", "a.cpp", "--kind", "execute", "--params", r#"{"suite":"smoke"}"#])
        .passes();

    let requests = backend.requests();
    assert!(requests
        .iter()
        .any(|r| r.starts_with(START) && r.contains(r#""kind":"execute""#) && r.contains(r#""suite":"smoke""#)));
}

#[test]
fn failed_job_exits_one_with_detail() {
    let backend = backend_with_job();
    backend.reply(
        STATUS,
        200,
        r#"{"status":"failed","result":{"status":"failed","counts":{"passed":4,"failed":2},"error":"2 assertions failed"}}"#,
    );

    cli()
        .backend(&backend)
        .args(&["job", "run", "a.cpp", "--kind", "execute"])
        .exits(1)
        .stdout_has("failed: 4 passed, 2 failed")
        .stdout_has("2 assertions failed");
}

#[test]
fn never_terminal_job_exits_two_after_timeout() {
    let backend = backend_with_job();
    backend.reply(STATUS, 200, r#"{"status":"running"}"#);

    cli()
        .backend(&backend)
        .args(&["job", "run", "a.cpp", "--timeout", "400ms"])
        .exits(2)
        .stdout_has("timeout")
        .stdout_has("outcome is unknown");
}

#[test]
fn no_wait_prints_job_id() {
    let backend = backend_with_job();

    cli().backend(&backend).args(&["job", "run", "a.cpp", "--no-wait"]).passes().stdout_eq("j-1\n");
}

#[test]
fn start_failure_exits_nonzero() {
    let backend = StubBackend::start();
    backend.reply(START, 500, "worker pool exhausted");

    cli()
        .backend(&backend)
        .args(&["job", "run", "a.cpp"])
        .fails()
        .stderr_has("worker pool exhausted");
}

#[test]
fn invalid_params_are_rejected() {
    cli().args(&["job", "run", "a.cpp", "--params", "[1]"]).fails().stderr_has("JSON object");
}

#[test]
fn status_reports_unknown_job() {
    let backend = StubBackend::start();

    cli().backend(&backend).args(&["job", "status", "j-404"]).passes().stdout_has("Job j-404: not_found");
}

#[test]
fn status_json_includes_report() {
    let backend = StubBackend::start();
    backend.reply(STATUS, 200, r#"{"status":"running","logs":"step 2/5"}"#);

    cli()
        .backend(&backend)
        .args(&["-o", "json", "job", "status", "j-1"])
        .passes()
        .stdout_has(r#""job_id": "j-1""#)
        .stdout_has(r#""logs": "step 2/5""#);
}
