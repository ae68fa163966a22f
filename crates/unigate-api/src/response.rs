// Response interpretation: the one place HTTP status semantics are decided.
//
// Endpoint modules never look at status codes; they receive a `Payload`
// or an `Error` and nothing else.

use bytes::Bytes;
use reqwest::StatusCode;
use serde_json::Value;

use crate::Error;

/// Fallback wait when the API rate-limits us without a usable
/// `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// What a successful API call produced.
///
/// Errors are raised through [`Error`], never encoded here, so callers
/// cannot forget to check a result code.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Decoded JSON body, envelope already unwrapped.
    Json(Value),
    /// Success with no usable body (many mutations return 200/204 with
    /// nothing, and some endpoints acknowledge in plain text).
    Empty,
    /// Raw bytes from a binary endpoint (snapshots, exports).
    Binary(Bytes),
}

/// Classify a completed JSON-API response.
///
/// Status checks run in most-specific-first order; see [`check_status`].
/// A success body that fails to parse as JSON is downgraded to
/// [`Payload::Empty`] with a warning rather than an error -- the vendor
/// occasionally acknowledges in `text/plain`.
pub(crate) fn interpret(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> Result<Payload, Error> {
    check_status(status, retry_after, body)?;

    if body.is_empty() {
        return Ok(Payload::Empty);
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(Payload::Json(unwrap_envelope(value))),
        Err(err) => {
            let preview = &body[..body.len().min(200)];
            tracing::warn!(%err, preview, "success response is not JSON, treating as empty");
            Ok(Payload::Empty)
        }
    }
}

/// Classify a completed binary response.
///
/// Error statuses classify exactly like JSON calls; a success passes the
/// bytes through untouched -- images and video are never JSON-wrapped.
pub(crate) fn interpret_binary(
    status: StatusCode,
    retry_after: Option<&str>,
    body: Bytes,
) -> Result<Payload, Error> {
    if status.as_u16() >= 400 {
        let text = String::from_utf8_lossy(&body);
        check_status(status, retry_after, &text)?;
    }
    Ok(Payload::Binary(body))
}

/// Map an error status to its taxonomy kind, most specific first.
pub(crate) fn check_status(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> Result<(), Error> {
    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Authentication {
            message: "authentication failed, check your API key".into(),
        }),
        StatusCode::FORBIDDEN => Err(Error::Authentication {
            message: "access forbidden, check your API key permissions".into(),
        }),
        StatusCode::NOT_FOUND => Err(Error::NotFound {
            status: status.as_u16(),
            body: body.to_owned(),
        }),
        StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited {
            // A missing or malformed header must not fail the call.
            retry_after_secs: retry_after
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            status: status.as_u16(),
            body: body.to_owned(),
        }),
        s if s.as_u16() >= 400 => Err(Error::Rejected {
            status: s.as_u16(),
            body: body.to_owned(),
        }),
        _ => Ok(()),
    }
}

/// Strip one level of the optional `{"data": ...}` envelope.
///
/// The API wraps some success payloads and not others, with no signal
/// for which; both shapes are treated as always-possible on every call.
/// Idempotent: an already-bare payload passes through unchanged.
pub(crate) fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    }
}
