// HTTP transport: connection pool lifecycle, timeouts, TLS policy.
//
// The pool is built lazily on first use and rebuilt if a request arrives
// after `close()` released it. Whether `close()` may release the pool at
// all depends on who created it; ownership is tracked explicitly so the
// shutdown path stays auditable.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

use crate::Error;

/// Timeouts applied uniformly to every request, binary fetches included.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Total per-request deadline.
    pub timeout: Duration,
    /// Connect-phase deadline, shorter than the total.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Who created the pool, and therefore who may release it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolOwnership {
    /// Built by this transport; `close()` drops it.
    Owned,
    /// Supplied by the caller; `close()` leaves it alone.
    Borrowed,
}

#[derive(Debug)]
struct PoolState {
    http: Option<reqwest::Client>,
    ownership: PoolOwnership,
}

/// Executes HTTP requests against the API.
///
/// Never interprets responses -- that is [`crate::response`]'s job -- but
/// converts every transport-level failure into the error taxonomy before
/// it reaches a caller.
#[derive(Debug)]
pub struct Transport {
    config: TransportConfig,
    verify_tls: bool,
    state: Mutex<PoolState>,
    closed: AtomicBool,
}

impl Transport {
    /// Transport that builds its own pool on first use.
    pub fn new(config: TransportConfig, verify_tls: bool) -> Self {
        Self {
            config,
            verify_tls,
            state: Mutex::new(PoolState {
                http: None,
                ownership: PoolOwnership::Owned,
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Transport over a caller-supplied `reqwest::Client`.
    ///
    /// The caller keeps ownership of the pool's lifetime; `close()` will
    /// not release it. TLS and timeout settings baked into the supplied
    /// client win over `config`.
    pub fn with_client(config: TransportConfig, verify_tls: bool, http: reqwest::Client) -> Self {
        Self {
            config,
            verify_tls,
            state: Mutex::new(PoolState {
                http: Some(http),
                ownership: PoolOwnership::Borrowed,
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether `close()` has been called.
    ///
    /// This flag gates the high-level client wrapper; `execute` itself
    /// does not consult it and will lazily rebuild a released pool.
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Mark the transport closed and release the pool if we own it.
    ///
    /// Idempotent. A borrowed pool is left untouched -- its owner decides
    /// when it dies.
    pub fn close(&self) {
        let mut state = self.state.lock().expect("transport pool lock poisoned");
        if state.ownership == PoolOwnership::Owned {
            state.http = None;
        }
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Get the pool, building one if none exists.
    fn ensure_pool(&self) -> Result<reqwest::Client, Error> {
        let mut state = self.state.lock().expect("transport pool lock poisoned");
        if let Some(http) = &state.http {
            return Ok(http.clone());
        }

        let mut builder = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .connect_timeout(self.config.connect_timeout);
        if !self.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(|e| Error::Connection {
            message: format!("failed to build HTTP client: {e}"),
        })?;

        state.http = Some(http.clone());
        state.ownership = PoolOwnership::Owned;
        Ok(http)
    }

    /// Send one request and return the raw response.
    ///
    /// `headers` must already be fully merged (user agent, content types,
    /// credentials, per-call extras); the transport adds nothing.
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: Url,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
        headers: HeaderMap,
    ) -> Result<reqwest::Response, Error> {
        let http = self.ensure_pool()?;

        let mut request = http.request(method, url.clone()).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(json) = body {
            request = request.json(json);
        }

        request
            .send()
            .await
            .map_err(|err| Error::from_transport(&url, &err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn close_is_idempotent_and_sets_flag() {
        let transport = Transport::new(TransportConfig::default(), true);
        assert!(!transport.closed());
        transport.close();
        transport.close();
        assert!(transport.closed());
    }

    #[test]
    fn owned_pool_is_released_on_close() {
        let transport = Transport::new(TransportConfig::default(), true);
        transport.ensure_pool().expect("pool builds offline");
        transport.close();
        let state = transport.state.lock().expect("lock");
        assert!(state.http.is_none());
    }

    #[test]
    fn borrowed_pool_survives_close() {
        let transport = Transport::with_client(
            TransportConfig::default(),
            true,
            reqwest::Client::new(),
        );
        transport.close();
        let state = transport.state.lock().expect("lock");
        assert!(state.http.is_some(), "caller-supplied pool must not be dropped");
    }

    #[test]
    fn pool_is_rebuilt_after_close() {
        let transport = Transport::new(TransportConfig::default(), true);
        transport.close();
        transport.ensure_pool().expect("pool rebuilds lazily");
        let state = transport.state.lock().expect("lock");
        assert!(state.http.is_some());
        assert_eq!(state.ownership, PoolOwnership::Owned);
    }
}
