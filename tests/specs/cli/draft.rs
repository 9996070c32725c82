//! `tb draft` specs against a stub backend

use crate::prelude::*;

#[test]
fn show_prints_saved_content() {
    let backend = StubBackend::start();
    backend.reply("GET /api/entities/a.cpp/draft", 200, r#"{"content":"TEST(Login, Works) {}\n"}"#);

    cli().backend(&backend).args(&["draft", "show", "a.cpp"]).passes().stdout_eq("TEST(Login, Works) {}\n");
}

#[test]
fn show_encodes_path_like_entity_ids() {
    let backend = StubBackend::start();
    backend.reply("GET /api/entities/tests%2Flogin.robot/draft", 200, r#"{"content":"*** Test Cases ***"}"#);

    cli()
        .backend(&backend)
        .args(&["draft", "show", "tests/login.robot"])
        .passes()
        .stdout_has("*** Test Cases ***");
}

#[test]
fn show_without_saved_draft_is_not_an_error() {
    let backend = StubBackend::start();

    cli()
        .backend(&backend)
        .args(&["draft", "show", "a.cpp"])
        .passes()
        .stdout_eq("")
        .stderr_has("No saved draft for a.cpp");
}

#[test]
fn show_json_includes_draft_state() {
    let backend = StubBackend::start();
    backend.reply("GET /api/entities/a.cpp/draft", 200, r#"{"content":"int main() {}"}"#);

    cli()
        .backend(&backend)
        .args(&["-o", "json", "draft", "show", "a.cpp"])
        .passes()
        .stdout_has(r#""entity_id": "a.cpp""#)
        .stdout_has(r#""hydration": "loaded""#)
        .stdout_has(r#""is_dirty": false"#);
}

#[test]
fn show_fails_when_backend_errors() {
    let backend = StubBackend::start();
    backend.reply("GET /api/entities/a.cpp/draft", 500, r#"{"detail":"database down"}"#);

    cli()
        .backend(&backend)
        .args(&["draft", "show", "a.cpp"])
        .fails()
        .stderr_has("Could not load saved draft")
        .stderr_has("database down");
}

#[test]
fn backend_flag_overrides_environment() {
    let backend = StubBackend::start();
    backend.reply("GET /api/entities/a.cpp/draft", 200, r#"{"content":"from flag"}"#);

    cli()
        .env("TB_BACKEND_URL", "http://127.0.0.1:1/api")
        .args(&["--backend", &backend.url(), "draft", "show", "a.cpp"])
        .passes()
        .stdout_has("from flag");
}

#[test]
fn save_from_stdin_puts_content() {
    let backend = StubBackend::start();
    backend.reply("PUT /api/entities/a.cpp/draft", 200, "{}");

    cli()
        .backend(&backend)
        .args(&["draft", "save", "a.cpp", "-"])
        .stdin("TEST(A, B) {}")
        .passes()
        .stdout_has("Saved draft for a.cpp");

    let requests = backend.requests();
    assert!(requests.contains(&r#"PUT /api/entities/a.cpp/draft {"content":"TEST(A, B) {}"}"#.to_string()));
}

#[test]
fn save_from_file_reports_unchanged_content() {
    let backend = StubBackend::start();
    backend.reply("GET /api/entities/a.cpp/draft", 200, r#"{"content":"same"}"#);
    backend.reply("PUT /api/entities/a.cpp/draft", 200, "{}");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.cpp");
    std::fs::write(&path, "same").unwrap();

    cli()
        .backend(&backend)
        .args(&["-o", "json", "draft", "save", "a.cpp", path.to_str().unwrap()])
        .passes()
        .stdout_has(r#""changed": false"#);
}

#[test]
fn rejected_save_fails() {
    let backend = StubBackend::start();
    backend.reply("PUT /api/entities/a.cpp/draft", 503, "busy");

    cli()
        .backend(&backend)
        .args(&["draft", "save", "a.cpp", "-"])
        .stdin("new")
        .fails()
        .stderr_has("saving draft for a.cpp");
}

#[test]
fn unreachable_backend_fails() {
    cli()
        .env("TB_BACKEND_URL", "http://127.0.0.1:1/api")
        .args(&["draft", "show", "a.cpp"])
        .fails()
        .stderr_has("Error:");
}
