//! WebSocket event subscriptions.
//!
//! A [`SubscriptionChannel`] maintains one live event stream and owns its
//! socket teardown. Two consumption modes share the machinery: a scoped
//! [`stream`](SubscriptionChannel::stream) that ends on the first
//! disconnect, and a supervised
//! [`subscribe_with_callback`](SubscriptionChannel::subscribe_with_callback)
//! loop that reconnects at a fixed delay until stopped.
//!
//! # Example
//!
//! ```rust,ignore
//! let channel = client.subscription(SubscriptionKind::Events, Some("site-1"))?;
//! let stopper = channel.clone();
//!
//! channel
//!     .subscribe_with_callback(ReconnectPolicy::default(), move |event| {
//!         println!("{event}");
//!         if done(&event) {
//!             stopper.stop();
//!         }
//!     })
//!     .await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Subscription target ──────────────────────────────────────────────

/// Which message feed a channel subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    /// Device state updates (`.../subscribe/devices`).
    Devices,
    /// Protect events: motion, rings, sensor triggers
    /// (`.../subscribe/events`).
    Events,
}

impl SubscriptionKind {
    /// The final path segment for this feed.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Events => "events",
        }
    }
}

// ── Reconnect policy ─────────────────────────────────────────────────

/// Whether and how fast a callback subscription reconnects.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    /// Fixed wait between a disconnect and the next attempt.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Duration::from_secs(5),
        }
    }
}

impl ReconnectPolicy {
    /// Never reconnect: the first disconnect ends the subscription.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            delay: Duration::ZERO,
        }
    }
}

// ── Channel state ────────────────────────────────────────────────────

/// Where a channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelState {
    Idle = 0,
    Connecting = 1,
    Streaming = 2,
    Reconnecting = 3,
}

impl ChannelState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Streaming,
            3 => Self::Reconnecting,
            _ => Self::Idle,
        }
    }
}

// ── SubscriptionChannel ──────────────────────────────────────────────

#[derive(Debug)]
struct ChannelInner {
    url: Url,
    headers: HeaderMap,
    verify_tls: bool,
    cancel: CancellationToken,
    state: AtomicU8,
}

/// One logical event subscription, independent of how many times it
/// reconnects underneath.
///
/// Cheap to clone; clones share the same socket, state, and cancellation
/// token, so a clone captured by the callback can [`stop`](Self::stop)
/// the channel from inside it. At most one socket is open per channel at
/// any time, and the channel -- not the caller -- tears it down.
#[derive(Debug, Clone)]
pub struct SubscriptionChannel {
    inner: Arc<ChannelInner>,
}

impl SubscriptionChannel {
    pub(crate) fn new(url: Url, headers: HeaderMap, verify_tls: bool) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                url,
                headers,
                verify_tls,
                cancel: CancellationToken::new(),
                state: AtomicU8::new(ChannelState::Idle as u8),
            }),
        }
    }

    /// The wss/ws endpoint this channel connects to.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// `false` once [`stop`](Self::stop) has been called.
    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    /// Stop the channel. Idempotent, safe from any task including the
    /// delivery callback; takes effect at the next suspension point, so
    /// within one message-delivery cycle.
    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }

    // ── Scoped stream mode ───────────────────────────────────────────

    /// Connect and stream decoded messages until disconnect or drop.
    ///
    /// No reconnection: a disconnect simply ends the stream, and the
    /// caller decides whether to acquire a new channel. Dropping the
    /// stream -- normally or during unwind -- releases the socket.
    pub async fn stream(&self) -> Result<impl Stream<Item = serde_json::Value> + Send, Error> {
        let socket = self.connect().await?;
        let guard = ActiveGuard {
            channel: self.clone(),
        };

        Ok(async_stream::stream! {
            let (_write, mut read) = socket.split();
            loop {
                tokio::select! {
                    biased;
                    () = guard.channel.inner.cancel.cancelled() => break,
                    frame = read.next() => match frame {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            match serde_json::from_str::<serde_json::Value>(text.as_str()) {
                                Ok(value) => yield value,
                                Err(err) => tracing::debug!(%err, "dropping malformed frame"),
                            }
                        }
                        Some(Ok(tungstenite::Message::Close(_))) | None => break,
                        Some(Err(err)) => {
                            tracing::debug!(%err, "WebSocket read error, ending stream");
                            break;
                        }
                        // ping/pong/binary -- nothing to surface
                        Some(Ok(_)) => {}
                    }
                }
            }
        })
    }

    // ── Callback mode with supervised reconnect ──────────────────────

    /// Connect, deliver every decoded message to `callback`, and on any
    /// disconnect or connect failure reconnect after `policy.delay` --
    /// for as long as the channel is running and the policy allows.
    ///
    /// Returns when the channel is stopped, or after the first
    /// disconnect when reconnection is disabled. Connect failures are
    /// not distinguished by cause here: an authentication failure during
    /// the handshake feeds the same reconnect decision as an unreachable
    /// host.
    pub async fn subscribe_with_callback<F>(&self, policy: ReconnectPolicy, mut callback: F)
    where
        F: FnMut(serde_json::Value) + Send,
    {
        while !self.inner.cancel.is_cancelled() {
            match self.connect().await {
                Ok(socket) => {
                    self.pump_frames(socket, &mut callback).await;
                    self.set_state(ChannelState::Idle);
                }
                Err(err) => {
                    tracing::warn!(%err, "subscription connect failed");
                }
            }

            if self.inner.cancel.is_cancelled() || !policy.enabled {
                break;
            }

            self.set_state(ChannelState::Reconnecting);
            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => break,
                () = tokio::time::sleep(policy.delay) => {}
            }
        }
        self.set_state(ChannelState::Idle);
    }

    /// Read frames from one socket until it ends or the channel stops.
    async fn pump_frames<F>(&self, socket: WsStream, callback: &mut F)
    where
        F: FnMut(serde_json::Value) + Send,
    {
        let (_write, mut read) = socket.split();
        loop {
            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => break,
                frame = read.next() => match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        // re-checked per message so stop() from inside
                        // the callback lands before the next delivery
                        if self.inner.cancel.is_cancelled() {
                            break;
                        }
                        match serde_json::from_str(text.as_str()) {
                            Ok(value) => callback(value),
                            Err(err) => tracing::debug!(%err, "dropping malformed frame"),
                        }
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "close frame received");
                        }
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!(%err, "WebSocket read error");
                        break;
                    }
                    None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    async fn connect(&self) -> Result<WsStream, Error> {
        self.begin_connect()?;

        let request = match self.handshake_request() {
            Ok(request) => request,
            Err(err) => {
                self.set_state(ChannelState::Idle);
                return Err(err);
            }
        };
        let connector = if self.inner.verify_tls {
            None
        } else {
            match insecure_tls_config() {
                Ok(config) => Some(Connector::Rustls(config)),
                Err(err) => {
                    self.set_state(ChannelState::Idle);
                    return Err(err);
                }
            }
        };

        tracing::debug!(url = %self.inner.url, "connecting subscription channel");
        let attempt =
            tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector);
        let result = tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => {
                self.set_state(ChannelState::Idle);
                return Err(Error::Connection {
                    message: "subscription stopped during connect".into(),
                });
            }
            result = attempt => result,
        };

        match result {
            Ok((socket, _response)) => {
                self.set_state(ChannelState::Streaming);
                Ok(socket)
            }
            Err(err) => {
                self.set_state(ChannelState::Idle);
                Err(Error::Connection {
                    message: format!("WebSocket connect to {} failed: {err}", self.inner.url),
                })
            }
        }
    }

    /// Claim the channel's single socket slot.
    fn begin_connect(&self) -> Result<(), Error> {
        for from in [ChannelState::Idle, ChannelState::Reconnecting] {
            if self
                .inner
                .state
                .compare_exchange(
                    from as u8,
                    ChannelState::Connecting as u8,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                return Ok(());
            }
        }
        Err(Error::Validation {
            message: "subscription channel already has an open socket".into(),
        })
    }

    fn handshake_request(&self) -> Result<ClientRequestBuilder, Error> {
        let uri: tungstenite::http::Uri = self.inner.url.as_str().parse().map_err(
            |e: tungstenite::http::uri::InvalidUri| Error::Validation {
                message: format!("invalid WebSocket URL: {e}"),
            },
        )?;

        let mut request = ClientRequestBuilder::new(uri);
        for (name, value) in &self.inner.headers {
            let value = value.to_str().map_err(|_| Error::Validation {
                message: format!("header {name} is not a valid WebSocket handshake value"),
            })?;
            request = request.with_header(name.as_str(), value);
        }
        Ok(request)
    }

    fn set_state(&self, state: ChannelState) {
        self.inner.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Resets the channel to `Idle` when a scoped stream is dropped, whether
/// it ended normally or the consumer unwound mid-iteration.
struct ActiveGuard {
    channel: SubscriptionChannel,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.channel.set_state(ChannelState::Idle);
    }
}

// ── TLS for self-signed consoles ─────────────────────────────────────

/// rustls config that accepts any server certificate, for channels whose
/// credential has TLS verification disabled.
fn insecure_tls_config() -> Result<Arc<rustls::ClientConfig>, Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Connection {
            message: format!("TLS configuration failed: {e}"),
        })?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth();
    Ok(Arc::new(config))
}

#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
