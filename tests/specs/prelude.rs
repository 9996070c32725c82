//! Shared helpers for specs: a `tb` command builder and a stub backend.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

/// Fast polling so job specs finish quickly
pub const POLL_INTERVAL_MS: &str = "50";

pub fn cli() -> CliBuilder {
    let mut cmd = assert_cmd::Command::cargo_bin("tb").unwrap();
    cmd.env_remove("TB_BACKEND_URL")
        .env_remove("TB_AUTH_TOKEN")
        .env_remove("TB_JOB_TIMEOUT_MS")
        .env("TB_POLL_INTERVAL_MS", POLL_INTERVAL_MS)
        .env("TB_REQUEST_TIMEOUT_MS", "2000")
        .env("NO_COLOR", "1");
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn backend(self, backend: &StubBackend) -> Self {
        let url = backend.url();
        self.env("TB_BACKEND_URL", &url)
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    fn run(mut self) -> RunOutput {
        let output = self.cmd.output().unwrap();
        RunOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Run and expect exit code 0
    pub fn passes(self) -> RunOutput {
        self.exits(0)
    }

    /// Run and expect a non-zero exit code
    pub fn fails(self) -> RunOutput {
        let out = self.run();
        assert_ne!(out.code, Some(0), "expected failure\nstdout: {}\nstderr: {}", out.stdout, out.stderr);
        out
    }

    pub fn exits(self, code: i32) -> RunOutput {
        let out = self.run();
        assert_eq!(
            out.code,
            Some(code),
            "unexpected exit code\nstdout: {}\nstderr: {}",
            out.stdout,
            out.stderr
        );
        out
    }
}

pub struct RunOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stdout_lacks(&self, needle: &str) -> &Self {
        assert!(!self.stdout.contains(needle), "stdout has {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn stdout_eq(&self, expected: &str) -> &Self {
        similar_asserts::assert_eq!(self.stdout, expected);
        self
    }
}

#[derive(Default)]
struct StubState {
    /// "METHOD /path" -> replies; the last reply repeats
    routes: HashMap<String, VecDeque<(u16, String)>>,
    /// "METHOD /path body" per request received
    requests: Vec<String>,
}

/// Minimal HTTP/1.1 backend on a background thread.
pub struct StubBackend {
    addr: SocketAddr,
    state: Arc<Mutex<StubState>>,
}

impl StubBackend {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(StubState::default()));
        let shared = Arc::clone(&state);
        std::thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                serve(stream, &shared);
            }
        });
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Queue a reply for `route`, e.g. `"GET /api/jobs/j-1"`.
    pub fn reply(&self, route: &str, status: u16, body: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .entry(route.to_string())
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn serve(stream: TcpStream, state: &Mutex<StubState>) {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }
    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let mut parts = request_line.split_whitespace();
    let route = format!("{} {}", parts.next().unwrap_or(""), parts.next().unwrap_or(""));
    let (status, reply) = {
        let mut state = state.lock().unwrap();
        state.requests.push(format!("{route} {}", String::from_utf8_lossy(&body)));
        match state.routes.get_mut(&route) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => (404, r#"{"detail":"not found"}"#.to_string()),
        }
    };

    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
        reply.len()
    );
    let _ = (&stream).write_all(response.as_bytes());
}
