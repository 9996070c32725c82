// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tb_core::RemoteJobStatus;
use tokio::net::TcpListener;

#[yare::parameterized(
    host_only     = { "http://backend",                "backend:80",     "" },
    host_port     = { "http://127.0.0.1:8000",         "127.0.0.1:8000", "" },
    with_prefix   = { "http://127.0.0.1:8000/api",     "127.0.0.1:8000", "/api" },
    trailing      = { "http://127.0.0.1:8000/api/v1/", "127.0.0.1:8000", "/api/v1" },
)]
fn base_url_parses(url: &str, authority: &str, prefix: &str) {
    let base = BaseUrl::parse(url).unwrap();
    assert_eq!(base.authority, authority);
    assert_eq!(base.prefix, prefix);
}

#[yare::parameterized(
    https      = { "https://backend" },
    no_scheme  = { "backend:8000" },
    empty_host = { "http:///api" },
)]
fn base_url_rejects(url: &str) {
    assert!(matches!(BaseUrl::parse(url), Err(RemoteError::InvalidUrl(_))));
}

#[yare::parameterized(
    plain      = { "a.cpp",              "a.cpp" },
    nested     = { "src/core/a.cpp",     "src%2Fcore%2Fa.cpp" },
    spaces     = { "my test.robot",      "my%20test.robot" },
    unicode    = { "é",                  "%C3%A9" },
)]
fn encode_segment_cases(input: &str, expected: &str) {
    assert_eq!(encode_segment(input), expected);
}

#[tokio::test]
async fn read_response_with_content_length() {
    let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}trailing";
    let mut reader = BufReader::new(&raw[..]);
    let response = read_http_response(&mut reader).await.unwrap();
    assert_eq!(response, HttpResponse { status: 200, body: "{}".into() });
}

#[tokio::test]
async fn read_response_without_content_length_reads_to_eof() {
    let raw = b"HTTP/1.1 404 Not Found\r\nconnection: close\r\n\r\nmissing";
    let mut reader = BufReader::new(&raw[..]);
    let response = read_http_response(&mut reader).await.unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.body, "missing");
}

#[tokio::test]
async fn read_response_decodes_chunked_body() {
    let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
        7\r\n{\"statu\r\n\
        A;ext=1\r\ns\":\"runnin\r\n\
        3\r\ng\"}\r\n\
        0\r\nX-Trailer: yes\r\n\r\n";
    let mut reader = BufReader::new(&raw[..]);
    let response = read_http_response(&mut reader).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"status":"running"}"#);
}

#[tokio::test]
async fn read_response_rejects_malformed_chunk_size() {
    let raw = b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\nzz\r\n{}\r\n0\r\n\r\n";
    let mut reader = BufReader::new(&raw[..]);
    assert!(matches!(read_http_response(&mut reader).await, Err(RemoteError::Request(_))));
}

#[tokio::test]
async fn read_response_rejects_oversized_content_length() {
    let raw = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{{}}", MAX_BODY_BYTES + 1);
    let mut reader = BufReader::new(raw.as_bytes());
    let err = read_http_response(&mut reader).await.unwrap_err();
    assert!(matches!(&err, RemoteError::Request(msg) if msg.contains("exceeds")), "{err:?}");
}

#[tokio::test]
async fn read_response_rejects_oversized_chunk() {
    let raw = format!("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n", MAX_BODY_BYTES + 1);
    let mut reader = BufReader::new(raw.as_bytes());
    let err = read_http_response(&mut reader).await.unwrap_err();
    assert!(matches!(&err, RemoteError::Request(msg) if msg.contains("exceeds")), "{err:?}");
}

#[tokio::test]
async fn read_response_rejects_garbage_status_line() {
    let raw = b"garbage\r\n\r\n";
    let mut reader = BufReader::new(&raw[..]);
    assert!(matches!(read_http_response(&mut reader).await, Err(RemoteError::Request(_))));
}

#[test]
fn render_request_includes_auth_and_body() {
    let client = HttpRemoteClient::new("http://127.0.0.1:9/api", Duration::from_secs(1))
        .unwrap()
        .with_auth_token("secret");
    let request = client.render_request("PUT", "/api/entities/a.cpp/draft", Some("{\"content\":\"x\"}"));
    assert!(request.starts_with("PUT /api/entities/a.cpp/draft HTTP/1.1\r\n"));
    assert!(request.contains("Host: 127.0.0.1:9\r\n"));
    assert!(request.contains("Authorization: Bearer secret\r\n"));
    assert!(request.contains("Content-Length: 15\r\n\r\n{\"content\":\"x\"}"));
}

/// Serve exactly one connection: capture the request head and reply with
/// `status` and `body`.
async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(&mut stream);
        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = v.trim().parse().unwrap();
            }
            if line == "\r\n" || line.is_empty() {
                break;
            }
            head.push_str(&line);
        }
        let mut body_buf = vec![0u8; content_length];
        reader.read_exact(&mut body_buf).await.unwrap();
        head.push_str(&String::from_utf8_lossy(&body_buf));
        let reply = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(reply.as_bytes()).await.unwrap();
        head
    });
    (format!("http://{addr}/api"), handle)
}

#[tokio::test]
async fn start_job_posts_kind_and_params() {
    let (url, server) = serve_once("201 Created", r#"{"job_id":"job-77"}"#).await;
    let client = HttpRemoteClient::new(&url, Duration::from_secs(5)).unwrap();
    let job = client
        .start_job(&EntityId::new("src/a.cpp"), JobKind::Generate, &serde_json::json!({"tool": "catch2"}))
        .await
        .unwrap();
    assert_eq!(job, "job-77");
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/entities/src%2Fa.cpp/jobs HTTP/1.1"));
    assert!(request.contains(r#""kind":"generate""#));
    assert!(request.contains(r#""tool":"catch2""#));
}

#[tokio::test]
async fn job_status_parses_report() {
    let (url, _server) =
        serve_once("200 OK", r#"{"status":"completed","content":"<generated>"}"#).await;
    let client = HttpRemoteClient::new(&url, Duration::from_secs(5)).unwrap();
    let report = client.job_status(&JobId::new("job-1")).await.unwrap();
    assert_eq!(report.status, RemoteJobStatus::Completed);
    assert_eq!(report.content.as_deref(), Some("<generated>"));
}

#[tokio::test]
async fn job_status_404_is_not_found_report() {
    let (url, _server) = serve_once("404 Not Found", "").await;
    let client = HttpRemoteClient::new(&url, Duration::from_secs(5)).unwrap();
    let report = client.job_status(&JobId::new("job-1")).await.unwrap();
    assert_eq!(report.status, RemoteJobStatus::NotFound);
}

#[tokio::test]
async fn load_draft_404_is_not_found_error() {
    let (url, _server) = serve_once("404 Not Found", r#"{"detail":"no draft"}"#).await;
    let client = HttpRemoteClient::new(&url, Duration::from_secs(5)).unwrap();
    let err = client.load_draft(&EntityId::new("a.cpp")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn load_draft_returns_content() {
    let (url, _server) = serve_once("200 OK", r#"{"content":"TEST_CASE(\"x\") {}"}"#).await;
    let client = HttpRemoteClient::new(&url, Duration::from_secs(5)).unwrap();
    let content = client.load_draft(&EntityId::new("a.cpp")).await.unwrap();
    assert_eq!(content, "TEST_CASE(\"x\") {}");
}

#[tokio::test]
async fn save_draft_server_error_is_request_error() {
    let (url, server) = serve_once("500 Internal Server Error", "boom").await;
    let client = HttpRemoteClient::new(&url, Duration::from_secs(5)).unwrap();
    let err = client.save_draft(&EntityId::new("a.cpp"), "body").await.unwrap_err();
    assert_eq!(err, RemoteError::Request("HTTP 500: boom".into()));
    let request = server.await.unwrap();
    assert!(request.contains(r#"{"content":"body"}"#));
}

#[tokio::test]
async fn connect_failure_is_request_error() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = HttpRemoteClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    let err = client.load_draft(&EntityId::new("a.cpp")).await.unwrap_err();
    assert!(matches!(err, RemoteError::Request(_)));
}
