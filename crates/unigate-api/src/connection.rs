// Connection mode resolution and request-path construction.
//
// LOCAL talks straight to one console; REMOTE goes through the cloud
// connector, which fans out to consoles by id. The two API products embed
// addressing differently (Protect folds a site segment into the REMOTE
// prefix), so each gets its own path builder -- they must not be unified.

use url::Url;

use crate::Error;

/// Default cloud connector host for remote connections.
pub const CLOUD_BASE_URL: &str = "https://api.ui.com";

/// Network Integration API prefix, shared by both connection modes.
pub(crate) const NETWORK_INTEGRATION_PREFIX: &str = "/proxy/network/integration/v1";

/// Protect Integration API prefix, shared by both connection modes.
pub(crate) const PROTECT_INTEGRATION_PREFIX: &str = "/proxy/protect/integration/v1";

/// How the client reaches the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Direct connection to one console (e.g. `https://192.168.1.1`).
    Local,
    /// Through the cloud connector, addressing a console by id.
    Remote,
}

/// Remote mode always carries its console id; an id-less remote context
/// is unrepresentable.
#[derive(Debug, Clone)]
enum Addressing {
    Local,
    Remote { console_id: String },
}

/// Where requests go: connection mode, base address, console id.
///
/// Validated at construction and immutable afterwards. A remote context
/// without a console id, or a local context without a parsable base
/// address, fails with [`Error::Validation`] before any network call.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    addressing: Addressing,
    base_url: Url,
}

impl ConnectionContext {
    /// Local context for a directly reachable console.
    pub fn local(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            addressing: Addressing::Local,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Remote context through the default cloud connector host.
    pub fn remote(console_id: impl Into<String>) -> Result<Self, Error> {
        Self::remote_with_base(CLOUD_BASE_URL, console_id)
    }

    /// Remote context through a non-default connector host.
    pub fn remote_with_base(base_url: &str, console_id: impl Into<String>) -> Result<Self, Error> {
        let console_id = console_id.into();
        if console_id.is_empty() {
            return Err(Error::Validation {
                message: "console id is required for remote connections".into(),
            });
        }
        Ok(Self {
            addressing: Addressing::Remote { console_id },
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn mode(&self) -> ConnectionMode {
        match self.addressing {
            Addressing::Local => ConnectionMode::Local,
            Addressing::Remote { .. } => ConnectionMode::Remote,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The console id, for remote contexts.
    pub fn console_id(&self) -> Option<&str> {
        match &self.addressing {
            Addressing::Local => None,
            Addressing::Remote { console_id } => Some(console_id),
        }
    }

    // ── Path builders ────────────────────────────────────────────────

    /// Request path for the Network (device-management) product.
    ///
    /// Site scoping is the caller's business: it lives inside `endpoint`
    /// (e.g. `/sites/{site_id}/devices`), identically for both modes.
    pub fn network_path(&self, endpoint: &str) -> String {
        let endpoint = normalize_endpoint(endpoint);
        match &self.addressing {
            Addressing::Local => format!("{NETWORK_INTEGRATION_PREFIX}{endpoint}"),
            Addressing::Remote { console_id } => format!(
                "/v1/connector/consoles/{console_id}{NETWORK_INTEGRATION_PREFIX}{endpoint}"
            ),
        }
    }

    /// Request path for the Protect (video-management) product.
    ///
    /// Local consoles host exactly one NVR, so the site segment is
    /// omitted even when `site_id` is supplied. Remote requests must
    /// name the site to disambiguate, so a missing `site_id` fails
    /// validation before any I/O.
    pub fn protect_path(&self, endpoint: &str, site_id: Option<&str>) -> Result<String, Error> {
        let endpoint = normalize_endpoint(endpoint);
        match &self.addressing {
            Addressing::Local => Ok(format!("{PROTECT_INTEGRATION_PREFIX}{endpoint}")),
            Addressing::Remote { console_id } => {
                let site = site_id.filter(|s| !s.is_empty()).ok_or_else(|| {
                    Error::Validation {
                        message: "site id is required for remote Protect requests".into(),
                    }
                })?;
                Ok(format!(
                    "/v1/connector/consoles/{console_id}{PROTECT_INTEGRATION_PREFIX}/sites/{site}{endpoint}"
                ))
            }
        }
    }

    /// Absolute request URL for a path produced by the builders above.
    pub(crate) fn request_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(|e| Error::Validation {
            message: format!("invalid request path {path:?}: {e}"),
        })
    }

    /// Request URL with the scheme switched to its WebSocket twin.
    pub(crate) fn websocket_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.request_url(path)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(Error::Validation {
                    message: format!("cannot upgrade scheme {other:?} to WebSocket"),
                });
            }
        };
        url.set_scheme(scheme).map_err(|()| Error::Validation {
            message: format!("cannot set WebSocket scheme on {url}"),
        })?;
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, Error> {
    Url::parse(raw).map_err(|e| Error::Validation {
        message: format!("invalid base address {raw:?}: {e}"),
    })
}

/// Guarantee a single leading slash so concatenation never doubles one.
fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim_start_matches('/');
    format!("/{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> ConnectionContext {
        ConnectionContext::local("https://192.168.1.1").expect("valid context")
    }

    fn remote() -> ConnectionContext {
        ConnectionContext::remote("c1").expect("valid context")
    }

    #[test]
    fn network_local_path() {
        assert_eq!(
            local().network_path("/sites/s1/devices"),
            "/proxy/network/integration/v1/sites/s1/devices"
        );
    }

    #[test]
    fn network_remote_path() {
        assert_eq!(
            remote().network_path("/sites/s1/devices"),
            "/v1/connector/consoles/c1/proxy/network/integration/v1/sites/s1/devices"
        );
    }

    #[test]
    fn protect_local_path_ignores_site() {
        let path = local()
            .protect_path("/cameras", Some("s1"))
            .expect("local never needs a site");
        assert_eq!(path, "/proxy/protect/integration/v1/cameras");
    }

    #[test]
    fn protect_remote_path_embeds_site() {
        let path = remote().protect_path("/cameras", Some("s1")).expect("site given");
        assert_eq!(
            path,
            "/v1/connector/consoles/c1/proxy/protect/integration/v1/sites/s1/cameras"
        );
    }

    #[test]
    fn protect_remote_without_site_fails() {
        let err = remote().protect_path("/cameras", None).expect_err("must fail");
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn missing_leading_slash_is_inserted() {
        assert_eq!(
            local().network_path("sites/s1/devices"),
            "/proxy/network/integration/v1/sites/s1/devices"
        );
    }

    #[test]
    fn no_double_slash() {
        let path = local().network_path("//info");
        assert!(!path.contains("//"), "got {path}");
    }

    #[test]
    fn remote_requires_console_id() {
        let err = ConnectionContext::remote("").expect_err("empty console id");
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn remote_defaults_to_cloud_host() {
        let ctx = remote();
        assert_eq!(ctx.base_url().as_str(), "https://api.ui.com/");
        assert_eq!(ctx.mode(), ConnectionMode::Remote);
        assert_eq!(ctx.console_id(), Some("c1"));
    }

    #[test]
    fn local_rejects_garbage_base() {
        let err = ConnectionContext::local("not a url").expect_err("must fail");
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn websocket_url_upgrades_scheme() {
        let url = local()
            .websocket_url("/proxy/protect/integration/v1/subscribe/events")
            .expect("valid");
        assert_eq!(url.scheme(), "wss");

        let plain = ConnectionContext::local("http://127.0.0.1:8080")
            .expect("valid context")
            .websocket_url("/x")
            .expect("valid");
        assert_eq!(plain.scheme(), "ws");
    }
}
