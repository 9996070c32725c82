// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST client for the test-management backend.
//!
//! Sends HTTP/1.1 requests over TCP with `Connection: close`. Responses are
//! framed by Content-Length or chunked transfer encoding, otherwise read to
//! EOF. Bodies larger than [`MAX_BODY_BYTES`] are rejected.

use super::{RemoteClient, RemoteError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tb_core::{EntityId, JobId, JobKind, JobStatusReport};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Largest response body accepted from the backend
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Parsed `http://host[:port][/prefix]` backend address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    /// `host:port`, used both to connect and as the Host header
    pub authority: String,
    /// Path prefix without trailing slash (may be empty)
    pub prefix: String,
}

impl BaseUrl {
    pub fn parse(url: &str) -> Result<Self, RemoteError> {
        let rest = url
            .trim()
            .strip_prefix("http://")
            .ok_or_else(|| RemoteError::InvalidUrl(format!("{url} (only http:// is supported)")))?;
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(RemoteError::InvalidUrl(format!("{url} (missing host)")));
        }
        let authority = if authority.contains(':') {
            authority.to_string()
        } else {
            format!("{authority}:80")
        };
        Ok(Self { authority, prefix: path.trim_end_matches('/').to_string() })
    }

    fn path(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }
}

/// Percent-encode an id as a single path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[derive(Debug, Serialize)]
struct StartJobBody<'a> {
    kind: JobKind,
    params: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StartJobResponse {
    job_id: JobId,
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftBody {
    content: String,
}

/// Raw response: status code and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Clone, Debug)]
pub struct HttpRemoteClient {
    base: BaseUrl,
    timeout: Duration,
    auth_token: Option<String>,
}

impl HttpRemoteClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self { base: BaseUrl::parse(url)?, timeout, auth_token: None })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base(&self) -> &BaseUrl {
        &self.base
    }

    fn render_request(&self, method: &str, path: &str, body: Option<&str>) -> String {
        let mut request = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\nAccept: application/json\r\nConnection: close\r\n",
            method, path, self.base.authority
        );
        if let Some(token) = &self.auth_token {
            request.push_str(&format!("Authorization: Bearer {token}\r\n"));
        }
        match body {
            Some(body) => request.push_str(&format!(
                "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            )),
            None => request.push_str("\r\n"),
        }
        request
    }

    /// Connect, send, and read with one timeout covering the whole exchange.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<HttpResponse, RemoteError> {
        let request = self.render_request(method, path, body);
        tracing::debug!(method, path, "backend request");
        tokio::time::timeout(self.timeout, send_request(&self.base.authority, &request))
            .await
            .map_err(|_| RemoteError::Request(format!("{method} {path} timed out")))?
    }

    fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, RemoteError> {
        serde_json::from_str(&response.body)
            .map_err(|e| RemoteError::Request(format!("invalid response body: {e}")))
    }
}

fn error_for_status(response: &HttpResponse, what: &str) -> Option<RemoteError> {
    match response.status {
        200..=299 => None,
        404 => Some(RemoteError::NotFound(what.to_string())),
        status => Some(RemoteError::Request(format!("HTTP {}: {}", status, response.body.trim()))),
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn start_job(
        &self,
        entity: &EntityId,
        kind: JobKind,
        params: &serde_json::Value,
    ) -> Result<JobId, RemoteError> {
        let path = self.base.path(&format!("/entities/{}/jobs", encode_segment(entity)));
        let body = serde_json::to_string(&StartJobBody { kind, params })
            .map_err(|e| RemoteError::Request(format!("encode failed: {e}")))?;
        let response = self.request("POST", &path, Some(&body)).await?;
        // A missing entity is a validation failure when starting a job
        if let Some(err) = error_for_status(&response, entity) {
            return Err(match err {
                RemoteError::NotFound(what) => RemoteError::Request(format!("unknown entity {what}")),
                other => other,
            });
        }
        Ok(Self::decode::<StartJobResponse>(&response)?.job_id)
    }

    async fn job_status(&self, job: &JobId) -> Result<JobStatusReport, RemoteError> {
        let path = self.base.path(&format!("/jobs/{}", encode_segment(job)));
        let response = self.request("GET", &path, None).await?;
        if response.status == 404 {
            return Ok(JobStatusReport::not_found());
        }
        if let Some(err) = error_for_status(&response, job) {
            return Err(err);
        }
        Self::decode(&response)
    }

    async fn load_draft(&self, entity: &EntityId) -> Result<String, RemoteError> {
        let path = self.base.path(&format!("/entities/{}/draft", encode_segment(entity)));
        let response = self.request("GET", &path, None).await?;
        if let Some(err) = error_for_status(&response, entity) {
            return Err(err);
        }
        Ok(Self::decode::<DraftBody>(&response)?.content)
    }

    async fn save_draft(&self, entity: &EntityId, content: &str) -> Result<(), RemoteError> {
        let path = self.base.path(&format!("/entities/{}/draft", encode_segment(entity)));
        let body = serde_json::to_string(&DraftBody { content: content.to_string() })
            .map_err(|e| RemoteError::Request(format!("encode failed: {e}")))?;
        let response = self.request("PUT", &path, Some(&body)).await?;
        match error_for_status(&response, entity) {
            // Saving is never "not found": the backend creates the draft
            Some(RemoteError::NotFound(what)) => {
                Err(RemoteError::Request(format!("save rejected for {what}")))
            }
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn send_request(authority: &str, request: &str) -> Result<HttpResponse, RemoteError> {
    let mut stream = TcpStream::connect(authority)
        .await
        .map_err(|e| RemoteError::Request(format!("connect to {authority} failed: {e}")))?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| RemoteError::Request(format!("write failed: {e}")))?;

    let mut reader = BufReader::new(&mut stream);
    read_http_response(&mut reader).await
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
pub(crate) async fn read_http_response<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<HttpResponse, RemoteError> {
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .await
        .map_err(|e| RemoteError::Request(format!("read status failed: {e}")))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| RemoteError::Request(format!("malformed status line: {}", status_line.trim())))?;

    // Headers are matched case-insensitively
    let mut content_length: Option<usize> = None;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| RemoteError::Request(format!("read header failed: {e}")))?;
        if line == "\r\n" || line == "\n" || line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().ok();
        } else if let Some(value) = lower.strip_prefix("transfer-encoding:") {
            chunked = value.split(',').any(|coding| coding.trim() == "chunked");
        }
    }

    let bytes = if chunked {
        read_chunked_body(reader).await?
    } else {
        match content_length {
            Some(0) => Vec::new(),
            Some(len) if len > MAX_BODY_BYTES => return Err(body_too_large(len)),
            Some(len) => {
                let mut buf = vec![0u8; len];
                reader
                    .read_exact(&mut buf)
                    .await
                    .map_err(|e| RemoteError::Request(format!("read body failed: {e}")))?;
                buf
            }
            None => {
                let mut buf = Vec::new();
                (&mut *reader)
                    .take(MAX_BODY_BYTES as u64 + 1)
                    .read_to_end(&mut buf)
                    .await
                    .map_err(|e| RemoteError::Request(format!("read body failed: {e}")))?;
                if buf.len() > MAX_BODY_BYTES {
                    return Err(body_too_large(buf.len()));
                }
                buf
            }
        }
    };

    Ok(HttpResponse { status, body: String::from_utf8_lossy(&bytes).into_owned() })
}

/// Decode a `Transfer-Encoding: chunked` body. Trailers are skipped.
async fn read_chunked_body<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<Vec<u8>, RemoteError> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader
            .read_line(&mut size_line)
            .await
            .map_err(|e| RemoteError::Request(format!("read chunk size failed: {e}")))?;
        // Chunk extensions follow a ';'
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| {
            RemoteError::Request(format!("malformed chunk size: {}", size_line.trim()))
        })?;
        if size == 0 {
            break;
        }
        let total = body.len().saturating_add(size);
        if total > MAX_BODY_BYTES {
            return Err(body_too_large(total));
        }

        let start = body.len();
        body.resize(total, 0);
        reader
            .read_exact(&mut body[start..])
            .await
            .map_err(|e| RemoteError::Request(format!("read chunk failed: {e}")))?;
        let mut crlf = String::new();
        reader
            .read_line(&mut crlf)
            .await
            .map_err(|e| RemoteError::Request(format!("read chunk failed: {e}")))?;
    }

    loop {
        let mut trailer = String::new();
        let read = reader
            .read_line(&mut trailer)
            .await
            .map_err(|e| RemoteError::Request(format!("read trailer failed: {e}")))?;
        if read == 0 || trailer == "\r\n" || trailer == "\n" {
            break;
        }
    }
    Ok(body)
}

fn body_too_large(len: usize) -> RemoteError {
    RemoteError::Request(format!("response body of {len} bytes exceeds {MAX_BODY_BYTES} byte limit"))
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
