//! Request-body redaction applied before any handler sees the payload.

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::redact::redact;

/// Largest request body the middleware will buffer; the same limit axum's
/// `Json` extractor applies by default.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Replace PII in POST and PUT bodies with `[REDACTED]`.
///
/// Bodies that are not valid UTF-8 are passed through unchanged. Bodies
/// larger than [`MAX_BODY_BYTES`] are refused with 413.
pub async fn redact_body(request: Request, next: Next) -> Result<Response, StatusCode> {
    if request.method() != Method::POST && request.method() != Method::PUT {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

    let bytes = match std::str::from_utf8(&bytes) {
        Ok(text) => Bytes::from(redact(text)),
        Err(_) => bytes,
    };

    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
