// Shared request pipeline for both product clients.
//
// One ApiClient = one credential + one connection context + one transport.
// Endpoint modules go through the verb helpers here and get back a
// `Payload` (or a typed record via the decode helpers); they never touch
// reqwest directly.

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::Credential;
use crate::connection::ConnectionContext;
use crate::response::{self, Payload};
use crate::transport::{Transport, TransportConfig};
use crate::Error;

/// Fixed user agent, embedding the library version.
const USER_AGENT_VALUE: &str = concat!("unigate/", env!("CARGO_PKG_VERSION"));

const CONTENT_TYPE_JSON: &str = "application/json";

/// Query parameters as owned pairs; endpoint modules build these inline.
pub type Query = Vec<(String, String)>;

/// Shared plumbing behind [`crate::NetworkClient`] and
/// [`crate::ProtectClient`].
///
/// Public so callers can issue requests against endpoints this crate does
/// not model yet, with the same addressing, headers, and error
/// classification as the built-in ones.
#[derive(Debug)]
pub struct ApiClient {
    credential: Credential,
    context: ConnectionContext,
    transport: Transport,
}

impl ApiClient {
    /// Client with its own lazily-built connection pool.
    pub fn new(credential: Credential, context: ConnectionContext, config: TransportConfig) -> Self {
        let verify_tls = credential.verify_tls();
        Self {
            credential,
            context,
            transport: Transport::new(config, verify_tls),
        }
    }

    /// Client over a caller-supplied `reqwest::Client`.
    ///
    /// The supplied pool is borrowed: [`close`](Self::close) will not
    /// release it.
    pub fn with_http_client(
        credential: Credential,
        context: ConnectionContext,
        config: TransportConfig,
        http: reqwest::Client,
    ) -> Self {
        let verify_tls = credential.verify_tls();
        Self {
            credential,
            context,
            transport: Transport::with_client(config, verify_tls, http),
        }
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn closed(&self) -> bool {
        self.transport.closed()
    }

    /// Shut the client down. Releases the pool if this client owns it;
    /// further requests fail with [`Error::Validation`].
    pub fn close(&self) {
        self.transport.close();
    }

    // ── Header assembly ──────────────────────────────────────────────

    /// Fixed headers + credential headers for JSON calls.
    pub(crate) fn json_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON));
        headers.extend(self.credential.header_map()?);
        Ok(headers)
    }

    /// Headers for binary GETs: accept anything, no JSON content type.
    fn binary_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = self.json_headers()?;
        headers.remove(CONTENT_TYPE);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        Ok(headers)
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.transport.closed() {
            return Err(Error::Validation {
                message: "client is closed".into(),
            });
        }
        Ok(())
    }

    // ── Request pipeline ─────────────────────────────────────────────

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        extra_headers: Option<&HeaderMap>,
    ) -> Result<Payload, Error> {
        self.ensure_open()?;

        let url = self.context.request_url(path)?;
        let mut headers = self.json_headers()?;
        if let Some(extra) = extra_headers {
            // Per-call extras override the fixed set.
            for (name, value) in extra {
                headers.insert(name, value.clone());
            }
        }

        debug!("{method} {url}");
        let resp = self.transport.execute(method, url.clone(), query, body, headers).await?;

        let status = resp.status();
        let retry_after = header_str(resp.headers(), RETRY_AFTER.as_str());
        let text = resp.text().await.map_err(|err| Error::from_transport(&url, &err))?;

        response::interpret(status, retry_after.as_deref(), &text)
    }

    // ── Verbs ────────────────────────────────────────────────────────

    pub async fn get(&self, path: &str) -> Result<Payload, Error> {
        self.request(Method::GET, path, &[], None, None).await
    }

    pub async fn get_with_params(&self, path: &str, query: &Query) -> Result<Payload, Error> {
        self.request(Method::GET, path, query, None, None).await
    }

    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Payload, Error> {
        self.request(Method::POST, path, &[], body, None).await
    }

    pub async fn put(&self, path: &str, body: Option<&Value>) -> Result<Payload, Error> {
        self.request(Method::PUT, path, &[], body, None).await
    }

    pub async fn patch(&self, path: &str, body: Option<&Value>) -> Result<Payload, Error> {
        self.request(Method::PATCH, path, &[], body, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Payload, Error> {
        self.request(Method::DELETE, path, &[], None, None).await
    }

    /// Fully general request with per-call extra headers.
    ///
    /// Extras override the fixed header set, so a caller can swap the
    /// `Accept` type for an endpoint this crate does not model.
    pub async fn request_with_headers(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
        extra_headers: &HeaderMap,
    ) -> Result<Payload, Error> {
        self.request(method, path, query, body, Some(extra_headers)).await
    }

    /// GET returning raw bytes (snapshots, exports).
    ///
    /// Error statuses classify exactly like JSON calls; success bodies
    /// are never unwrapped or decoded.
    pub async fn get_binary(&self, path: &str, query: &Query) -> Result<Bytes, Error> {
        self.ensure_open()?;

        let url = self.context.request_url(path)?;
        let headers = self.binary_headers()?;

        debug!("GET {url} (binary)");
        let resp = self
            .transport
            .execute(Method::GET, url.clone(), query, None, headers)
            .await?;

        let status = resp.status();
        let retry_after = header_str(resp.headers(), RETRY_AFTER.as_str());
        let body = resp.bytes().await.map_err(|err| Error::from_transport(&url, &err))?;

        match response::interpret_binary(status, retry_after.as_deref(), body)? {
            Payload::Binary(bytes) => Ok(bytes),
            // interpret_binary only ever returns Binary on success.
            Payload::Json(_) | Payload::Empty => Ok(Bytes::new()),
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

// ── Typed decode helpers ─────────────────────────────────────────────

/// Serialize a typed request body into the JSON the transport sends.
pub(crate) fn to_body<T: serde::Serialize>(body: &T) -> Result<Value, Error> {
    serde_json::to_value(body).map_err(|e| Error::Validation {
        message: format!("request body failed to serialize: {e}"),
    })
}

/// Decode a JSON payload into one typed record.
///
/// `what` names the record for the error message. An empty payload is a
/// missing record, not a success.
pub(crate) fn decode<T: DeserializeOwned>(payload: Payload, what: &str) -> Result<T, Error> {
    match payload {
        Payload::Json(value) => serde_json::from_value(value).map_err(|e| Error::Validation {
            message: format!("{what}: response did not match the expected shape: {e}"),
        }),
        Payload::Empty => Err(Error::Validation {
            message: format!("{what}: response had no payload"),
        }),
        Payload::Binary(_) => Err(Error::Validation {
            message: format!("{what}: unexpected binary payload"),
        }),
    }
}

/// Decode a JSON payload into a list of typed records.
///
/// Empty and non-list payloads yield an empty list -- list endpoints
/// report "nothing there" in several shapes and none of them is an error.
pub(crate) fn decode_list<T: DeserializeOwned>(payload: Payload, what: &str) -> Result<Vec<T>, Error> {
    match payload {
        Payload::Json(value @ Value::Array(_)) => {
            serde_json::from_value(value).map_err(|e| Error::Validation {
                message: format!("{what}: response did not match the expected shape: {e}"),
            })
        }
        Payload::Json(_) | Payload::Empty => Ok(Vec::new()),
        Payload::Binary(_) => Err(Error::Validation {
            message: format!("{what}: unexpected binary payload"),
        }),
    }
}
