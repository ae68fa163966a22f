use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::Error;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Credentials for authenticating with the UniFi APIs.
///
/// Each variant carries the secret material for its flow. Variants are
/// immutable once constructed and cheap to clone, so one credential can
/// back any number of concurrent requests. New kinds (e.g. a bearer
/// token) are additive: call sites only ever ask for [`header_map`]
/// and [`verify_tls`].
///
/// [`header_map`]: Credential::header_map
/// [`verify_tls`]: Credential::verify_tls
#[derive(Debug, Clone)]
pub enum Credential {
    /// Cloud API key for connections through the `api.ui.com` connector.
    /// Generated at: <https://unifi.ui.com> > Settings > API Keys.
    ApiKey { key: SecretString },

    /// Console-local API key for direct connections.
    /// Generated on the console under Control Plane > Integrations.
    /// `verify_tls` is off for consoles with self-signed certificates.
    Local { key: SecretString, verify_tls: bool },
}

impl Credential {
    /// Cloud API key credential.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey {
            key: SecretString::from(key.into()),
        }
    }

    /// Console-local API key credential.
    pub fn local(key: impl Into<String>, verify_tls: bool) -> Self {
        Self::Local {
            key: SecretString::from(key.into()),
            verify_tls,
        }
    }

    /// Authentication headers for API requests.
    ///
    /// Both current variants emit a single `X-API-Key` header, marked
    /// sensitive so it never shows up in debug output. Fails only when
    /// the key contains bytes that are invalid in an HTTP header; that
    /// key could never authenticate, so the error surfaces as
    /// [`Error::Authentication`] before any I/O.
    pub fn header_map(&self) -> Result<HeaderMap, Error> {
        let key = match self {
            Self::ApiKey { key } | Self::Local { key, .. } => key,
        };
        let mut value =
            HeaderValue::from_str(key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("API key is not a valid header value: {e}"),
            })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, value);
        Ok(headers)
    }

    /// Whether TLS certificates must verify for this credential.
    ///
    /// Only [`Credential::Local`] may opt out (self-signed console
    /// certificates); every other variant always verifies.
    pub fn verify_tls(&self) -> bool {
        match self {
            Self::Local { verify_tls, .. } => *verify_tls,
            Self::ApiKey { .. } => true,
        }
    }
}
