use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use rand::Rng;
use serde_json::Value;
use std::time::Instant;

use crate::api::error_response;

/// Trace id stored in request extensions and echoed in `X-Trace-Id`.
#[derive(Clone)]
pub struct TraceId(pub String);

impl std::ops::Deref for TraceId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

fn generate_trace_id() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

const MAX_LOGGED_MSG_CHARS: usize = 200;
/// Error envelopes are small; anything larger is not ours.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Truncate to at most `max` bytes without splitting a character.
fn truncate_body(bytes: &[u8], max: usize) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if s.len() > max => {
            let mut end = max;
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &s[..end])
        }
        Ok(s) => s.to_string(),
        Err(_) => "<non-utf8 body>".to_string(),
    }
}

fn format_elapsed(elapsed_us: u128) -> String {
    if elapsed_us < 1000 {
        format!("{elapsed_us}µs")
    } else if elapsed_us < 1_000_000 {
        format!("{}ms", elapsed_us / 1000)
    } else {
        format!("{:.1}s", elapsed_us as f64 / 1_000_000.0)
    }
}

fn with_trace_header(mut response: Response, trace_id: &str) -> Response {
    if let Ok(val) = HeaderValue::from_str(trace_id) {
        response.headers_mut().insert("X-Trace-Id", val);
    }
    response
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `(err_code, err_msg)` of an error envelope. Non-envelope bodies (axum
/// rejections are plain text) come back as a truncated message.
fn envelope_error(bytes: &[u8]) -> (Option<i64>, String) {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(v) => (
            v["err_code"].as_i64(),
            v["err_msg"]
                .as_str()
                .map(|m| truncate_body(m.as_bytes(), MAX_LOGGED_MSG_CHARS))
                .unwrap_or_default(),
        ),
        Err(_) => (None, truncate_body(bytes, MAX_LOGGED_MSG_CHARS)),
    }
}

/// Assigns a trace id and logs one line per request and response.
///
/// Request bodies are never read: credentials only travel through `/auth`
/// and the only other body is the multipart image upload, logged by size.
/// Successful responses pass through untouched; error responses are buffered
/// so the envelope's code and message can be logged.
pub async fn request_logging(mut req: Request, next: Next) -> Response {
    let trace_id = generate_trace_id();
    req.extensions_mut().insert(TraceId(trace_id.clone()));

    // Swagger UI assets
    if req.uri().path().starts_with("/docs") {
        let response = next.run(req).await;
        return with_trace_header(response, &trace_id);
    }

    let method = req.method().clone();
    let url = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let upload_bytes = header_str(req.headers(), header::CONTENT_LENGTH)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|n| *n > 0);
    let user_agent = header_str(req.headers(), header::USER_AGENT)
        .unwrap_or("-")
        .to_string();

    tracing::info!(
        trace_id = %trace_id,
        method = %method,
        path = %url,
        upload_bytes = ?upload_bytes,
        ua = %user_agent,
        "--> request"
    );

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = format_elapsed(start.elapsed().as_micros());
    let status = response.status();

    if !status.is_client_error() && !status.is_server_error() {
        tracing::info!(
            trace_id = %trace_id,
            status = status.as_u16(),
            elapsed = %elapsed,
            "<-- response"
        );
        return with_trace_header(response, &trace_id);
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(
                trace_id = %trace_id,
                status = status.as_u16(),
                error = %e,
                "Failed to read error response body"
            );
            let replacement = error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "internal_error",
                "Failed to produce response",
            );
            return with_trace_header(replacement, &trace_id);
        }
    };

    let (err_code, err_msg) = envelope_error(&bytes);
    if status.is_server_error() {
        tracing::error!(
            trace_id = %trace_id,
            status = status.as_u16(),
            elapsed = %elapsed,
            err_code = ?err_code,
            err_msg = %err_msg,
            "<-- response"
        );
    } else {
        tracing::warn!(
            trace_id = %trace_id,
            status = status.as_u16(),
            elapsed = %elapsed,
            err_code = ?err_code,
            err_msg = %err_msg,
            "<-- response"
        );
    }

    with_trace_header(Response::from_parts(parts, Body::from(bytes)), &trace_id)
}
