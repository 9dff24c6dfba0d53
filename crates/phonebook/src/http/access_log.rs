//! Per-request access log.
//!
//! One line per request, written after the inner service has produced its
//! response:
//!
//! ```text
//! POST /api/persons 200 61 - 1.204 ms {"name":"Ada","number":"12-345-6789"}
//! ```

use std::fmt::Write as _;
use std::future::poll_fn;
use std::pin::Pin;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes, HttpBody as _};
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info};

use crate::logging::ACCESS_TARGET;

use super::error::ErrorBody;

/// State for the access log middleware.
#[derive(Debug, Clone, Copy)]
pub struct AccessLog {
    /// Largest request body buffered for logging.
    pub body_limit: usize,
}

/// Middleware entry point, installed with `middleware::from_fn_with_state`.
pub async fn log_access(
    State(log): State<AccessLog>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let target = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), ToString::to_string);

    let (request, payload) = if method == Method::POST {
        match buffer_body(request, log.body_limit).await {
            Ok((request, payload)) => (request, Some(payload)),
            Err(response) => {
                emit(&method, &target, &response, start.elapsed(), None);
                return response;
            }
        }
    } else {
        (request, None)
    };

    let response = next.run(request).await;
    emit(&method, &target, &response, start.elapsed(), payload.as_deref());
    response
}

/// Why a request body could not be buffered.
#[derive(Debug)]
enum ReadFailure {
    TooLarge,
    Broken(axum::Error),
}

/// Read the whole body so it can be logged, then put it back.
async fn buffer_body(request: Request, limit: usize) -> Result<(Request, String), Response> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(reject(&ReadFailure::TooLarge, limit));
    }

    let (parts, body) = request.into_parts();
    let bytes = read_limited(body, limit)
        .await
        .map_err(|failure| reject(&failure, limit))?;
    let payload = render_payload(&bytes);
    Ok((Request::from_parts(parts, Body::from(bytes)), payload))
}

async fn read_limited(mut body: Body, limit: usize) -> Result<Bytes, ReadFailure> {
    let mut buf = Vec::new();
    while let Some(frame) = poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await {
        let frame = frame.map_err(ReadFailure::Broken)?;
        if let Ok(data) = frame.into_data() {
            if buf.len() + data.len() > limit {
                return Err(ReadFailure::TooLarge);
            }
            buf.extend_from_slice(&data);
        }
    }
    Ok(Bytes::from(buf))
}

fn reject(failure: &ReadFailure, limit: usize) -> Response {
    let (status, message) = match failure {
        ReadFailure::TooLarge => (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("request body exceeds {limit} bytes"),
        ),
        ReadFailure::Broken(err) => {
            debug!("Failed to read request body: {err}");
            (
                StatusCode::BAD_REQUEST,
                "failed to read request body".to_string(),
            )
        }
    };
    (status, Json(ErrorBody::new(message))).into_response()
}

/// Compact JSON for JSON bodies, the raw text otherwise.
#[must_use]
pub fn render_payload(bytes: &Bytes) -> String {
    if bytes.is_empty() {
        return "{}".to_string();
    }
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Length of the response body if it can be known without reading it.
fn response_len(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or_else(|| response.body().size_hint().exact())
}

fn emit(
    method: &Method,
    target: &str,
    response: &Response,
    elapsed: Duration,
    payload: Option<&str>,
) {
    let line = format_line(
        method,
        target,
        response.status(),
        response_len(response),
        elapsed,
        payload,
    );
    info!(target: ACCESS_TARGET, "{line}");
}

/// Build one access log line.
#[must_use]
pub fn format_line(
    method: &Method,
    target: &str,
    status: StatusCode,
    len: Option<u64>,
    elapsed: Duration,
    payload: Option<&str>,
) -> String {
    let mut line = format!("{method} {target} {}", status.as_u16());
    match len {
        Some(len) => {
            let _ = write!(line, " {len}");
        }
        None => line.push_str(" -"),
    }
    let _ = write!(line, " - {:.3} ms", elapsed.as_secs_f64() * 1000.0);
    if let Some(payload) = payload {
        line.push(' ');
        line.push_str(payload);
    }
    line
}
