// Endpoint methods for the Protect Integration API.
//
// Protect addressing is site-aware: every method takes `site`, which
// local connections ignore (one console, one NVR) and remote connections
// require. Passing `None` on a remote client fails validation before any
// network I/O.

use serde_json::json;

use super::types;
use crate::auth::Credential;
use crate::client::{ApiClient, Query, decode, decode_list, to_body};
use crate::connection::ConnectionContext;
use crate::response::Payload;
use crate::transport::TransportConfig;
use crate::websocket::{SubscriptionChannel, SubscriptionKind};
use crate::Error;

/// Async client for the UniFi Protect Integration API.
#[derive(Debug)]
pub struct ProtectClient {
    api: ApiClient,
}

impl ProtectClient {
    pub fn new(credential: Credential, context: ConnectionContext) -> Self {
        Self::with_config(credential, context, TransportConfig::default())
    }

    pub fn with_config(
        credential: Credential,
        context: ConnectionContext,
        config: TransportConfig,
    ) -> Self {
        Self {
            api: ApiClient::new(credential, context, config),
        }
    }

    /// Reuse a caller-owned `reqwest::Client`; `close()` will not
    /// release it.
    pub fn with_http_client(
        credential: Credential,
        context: ConnectionContext,
        config: TransportConfig,
        http: reqwest::Client,
    ) -> Self {
        Self {
            api: ApiClient::with_http_client(credential, context, config, http),
        }
    }

    /// The shared request plumbing, for endpoints not modeled here.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn closed(&self) -> bool {
        self.api.closed()
    }

    pub fn close(&self) {
        self.api.close();
    }

    fn path(&self, endpoint: &str, site: Option<&str>) -> Result<String, Error> {
        self.api.context().protect_path(endpoint, site)
    }

    // ── Application ──────────────────────────────────────────────────

    pub async fn application_info(
        &self,
        site: Option<&str>,
    ) -> Result<types::ApplicationInfo, Error> {
        let payload = self.api.get(&self.path("/meta/info", site)?).await?;
        decode(payload, "application info")
    }

    /// Enumerate sites. Local consoles only — a remote connection
    /// already names its site on every call.
    pub async fn list_sites(&self) -> Result<Vec<types::Site>, Error> {
        let payload = self.api.get(&self.path("/sites", None)?).await?;
        decode_list(payload, "sites")
    }

    /// Cheap probe that authentication and addressing both work.
    pub async fn validate_connection(&self, site: Option<&str>) -> Result<bool, Error> {
        let payload = self.api.get(&self.path("/meta/info", site)?).await?;
        Ok(!matches!(payload, Payload::Empty))
    }

    // ── Cameras ──────────────────────────────────────────────────────

    pub async fn list_cameras(&self, site: Option<&str>) -> Result<Vec<types::Camera>, Error> {
        let payload = self.api.get(&self.path("/cameras", site)?).await?;
        decode_list(payload, "cameras")
    }

    pub async fn get_camera(
        &self,
        site: Option<&str>,
        camera: &str,
    ) -> Result<types::Camera, Error> {
        let payload = self.api.get(&self.path(&format!("/cameras/{camera}"), site)?).await?;
        decode(payload, "camera")
    }

    pub async fn update_camera(
        &self,
        site: Option<&str>,
        camera: &str,
        patch: &types::CameraPatch,
    ) -> Result<types::Camera, Error> {
        let payload = self
            .api
            .patch(
                &self.path(&format!("/cameras/{camera}"), site)?,
                Some(&to_body(patch)?),
            )
            .await?;
        decode(payload, "updated camera")
    }

    pub async fn set_recording_mode(
        &self,
        site: Option<&str>,
        camera: &str,
        mode: &str,
    ) -> Result<types::Camera, Error> {
        let patch = types::CameraPatch {
            recording_mode: Some(mode.to_owned()),
            ..types::CameraPatch::default()
        };
        self.update_camera(site, camera, &patch).await
    }

    pub async fn set_microphone_volume(
        &self,
        site: Option<&str>,
        camera: &str,
        volume: i64,
    ) -> Result<types::Camera, Error> {
        if !(0..=100).contains(&volume) {
            return Err(Error::Validation {
                message: format!("microphone volume must be between 0 and 100, got {volume}"),
            });
        }
        let patch = types::CameraPatch {
            mic_volume: Some(volume),
            ..types::CameraPatch::default()
        };
        self.update_camera(site, camera, &patch).await
    }

    /// Fetch a JPEG snapshot. Returns the raw image bytes.
    pub async fn camera_snapshot(
        &self,
        site: Option<&str>,
        camera: &str,
        high_quality: bool,
    ) -> Result<bytes::Bytes, Error> {
        let mut query = Query::new();
        if high_quality {
            query.push(("highQuality".into(), "true".into()));
        }
        self.api
            .get_binary(&self.path(&format!("/cameras/{camera}/snapshot"), site)?, &query)
            .await
    }

    /// Mint token-based RTSPS stream URLs for the given qualities
    /// (`"high"`, `"medium"`, `"low"`).
    pub async fn create_rtsps_streams(
        &self,
        site: Option<&str>,
        camera: &str,
        qualities: &[&str],
    ) -> Result<types::RtspsStreams, Error> {
        let payload = self
            .api
            .post(
                &self.path(&format!("/cameras/{camera}/rtsps-stream"), site)?,
                Some(&json!({ "qualities": qualities })),
            )
            .await?;
        decode(payload, "rtsps streams")
    }

    pub async fn get_rtsps_streams(
        &self,
        site: Option<&str>,
        camera: &str,
    ) -> Result<types::RtspsStreams, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/cameras/{camera}/rtsps-stream"), site)?)
            .await?;
        decode(payload, "rtsps streams")
    }

    // ── Sensors ──────────────────────────────────────────────────────

    pub async fn list_sensors(&self, site: Option<&str>) -> Result<Vec<types::Sensor>, Error> {
        let payload = self.api.get(&self.path("/sensors", site)?).await?;
        decode_list(payload, "sensors")
    }

    pub async fn get_sensor(
        &self,
        site: Option<&str>,
        sensor: &str,
    ) -> Result<types::Sensor, Error> {
        let payload = self.api.get(&self.path(&format!("/sensors/{sensor}"), site)?).await?;
        decode(payload, "sensor")
    }

    pub async fn set_sensor_motion_sensitivity(
        &self,
        site: Option<&str>,
        sensor: &str,
        sensitivity: i64,
    ) -> Result<types::Sensor, Error> {
        if !(0..=100).contains(&sensitivity) {
            return Err(Error::Validation {
                message: format!("motion sensitivity must be between 0 and 100, got {sensitivity}"),
            });
        }
        let payload = self
            .api
            .patch(
                &self.path(&format!("/sensors/{sensor}"), site)?,
                Some(&json!({ "motionSensitivity": sensitivity })),
            )
            .await?;
        decode(payload, "updated sensor")
    }

    // ── Lights ───────────────────────────────────────────────────────

    pub async fn list_lights(&self, site: Option<&str>) -> Result<Vec<types::Light>, Error> {
        let payload = self.api.get(&self.path("/lights", site)?).await?;
        decode_list(payload, "lights")
    }

    pub async fn get_light(&self, site: Option<&str>, light: &str) -> Result<types::Light, Error> {
        let payload = self.api.get(&self.path(&format!("/lights/{light}"), site)?).await?;
        decode(payload, "light")
    }

    /// Set the light mode: `"on"`, `"off"`, or `"motion"`.
    pub async fn set_light_mode(
        &self,
        site: Option<&str>,
        light: &str,
        mode: &str,
    ) -> Result<types::Light, Error> {
        let payload = self
            .api
            .patch(
                &self.path(&format!("/lights/{light}"), site)?,
                Some(&json!({ "lightMode": mode })),
            )
            .await?;
        decode(payload, "updated light")
    }

    pub async fn set_light_brightness(
        &self,
        site: Option<&str>,
        light: &str,
        brightness: i64,
    ) -> Result<types::Light, Error> {
        if !(0..=100).contains(&brightness) {
            return Err(Error::Validation {
                message: format!("brightness must be between 0 and 100, got {brightness}"),
            });
        }
        let payload = self
            .api
            .patch(
                &self.path(&format!("/lights/{light}"), site)?,
                Some(&json!({ "brightness": brightness })),
            )
            .await?;
        decode(payload, "updated light")
    }

    // ── Chimes ───────────────────────────────────────────────────────

    pub async fn list_chimes(&self, site: Option<&str>) -> Result<Vec<types::Chime>, Error> {
        let payload = self.api.get(&self.path("/chimes", site)?).await?;
        decode_list(payload, "chimes")
    }

    pub async fn get_chime(&self, site: Option<&str>, chime: &str) -> Result<types::Chime, Error> {
        let payload = self.api.get(&self.path(&format!("/chimes/{chime}"), site)?).await?;
        decode(payload, "chime")
    }

    pub async fn set_chime_volume(
        &self,
        site: Option<&str>,
        chime: &str,
        volume: i64,
    ) -> Result<types::Chime, Error> {
        if !(0..=100).contains(&volume) {
            return Err(Error::Validation {
                message: format!("volume must be between 0 and 100, got {volume}"),
            });
        }
        let payload = self
            .api
            .patch(
                &self.path(&format!("/chimes/{chime}"), site)?,
                Some(&json!({ "volume": volume })),
            )
            .await?;
        decode(payload, "updated chime")
    }

    // ── Viewers / live views ─────────────────────────────────────────

    pub async fn list_viewers(&self, site: Option<&str>) -> Result<Vec<types::Viewer>, Error> {
        let payload = self.api.get(&self.path("/viewers", site)?).await?;
        decode_list(payload, "viewers")
    }

    pub async fn get_viewer(
        &self,
        site: Option<&str>,
        viewer: &str,
    ) -> Result<types::Viewer, Error> {
        let payload = self.api.get(&self.path(&format!("/viewers/{viewer}"), site)?).await?;
        decode(payload, "viewer")
    }

    pub async fn set_viewer_liveview(
        &self,
        site: Option<&str>,
        viewer: &str,
        liveview: &str,
    ) -> Result<types::Viewer, Error> {
        let payload = self
            .api
            .patch(
                &self.path(&format!("/viewers/{viewer}"), site)?,
                Some(&json!({ "liveview": liveview })),
            )
            .await?;
        decode(payload, "updated viewer")
    }

    pub async fn list_liveviews(&self, site: Option<&str>) -> Result<Vec<types::Liveview>, Error> {
        let payload = self.api.get(&self.path("/liveviews", site)?).await?;
        decode_list(payload, "liveviews")
    }

    pub async fn get_liveview(
        &self,
        site: Option<&str>,
        liveview: &str,
    ) -> Result<types::Liveview, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/liveviews/{liveview}"), site)?)
            .await?;
        decode(payload, "liveview")
    }

    // ── NVR ──────────────────────────────────────────────────────────

    pub async fn get_nvr(&self, site: Option<&str>) -> Result<types::Nvr, Error> {
        let payload = self.api.get(&self.path("/nvrs", site)?).await?;
        decode(payload, "nvr")
    }

    // ── Events ───────────────────────────────────────────────────────

    /// List events, newest first. `start`/`end` are epoch milliseconds.
    pub async fn list_events(
        &self,
        site: Option<&str>,
        filter: &EventFilter,
    ) -> Result<Vec<types::Event>, Error> {
        let payload = self
            .api
            .get_with_params(&self.path("/events", site)?, &filter.to_query())
            .await?;
        decode_list(payload, "events")
    }

    pub async fn get_event(&self, site: Option<&str>, event: &str) -> Result<types::Event, Error> {
        let payload = self.api.get(&self.path(&format!("/events/{event}"), site)?).await?;
        decode(payload, "event")
    }

    // ── Files ────────────────────────────────────────────────────────

    /// List device asset files of one type (e.g. `"ringtones"`).
    pub async fn list_device_asset_files(
        &self,
        site: Option<&str>,
        file_type: &str,
    ) -> Result<Vec<types::DeviceAssetFile>, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/files/{file_type}"), site)?)
            .await?;
        decode_list(payload, "device asset files")
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Build a subscription channel for one message feed.
    ///
    /// The channel carries the same merged headers as HTTP requests and
    /// inherits the credential's TLS policy. Consume it with
    /// [`SubscriptionChannel::stream`] for scoped iteration or
    /// [`SubscriptionChannel::subscribe_with_callback`] for supervised
    /// reconnection.
    pub fn subscription(
        &self,
        kind: SubscriptionKind,
        site: Option<&str>,
    ) -> Result<SubscriptionChannel, Error> {
        let path = self.path(&format!("/subscribe/{}", kind.as_str()), site)?;
        let url = self.api.context().websocket_url(&path)?;
        let headers = self.api.json_headers()?;
        Ok(SubscriptionChannel::new(
            url,
            headers,
            self.api.credential().verify_tls(),
        ))
    }
}

/// Query filter for [`ProtectClient::list_events`].
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Epoch milliseconds, inclusive.
    pub start: Option<i64>,
    /// Epoch milliseconds, exclusive.
    pub end: Option<i64>,
    /// Event types, e.g. `motion`, `smartDetect`, `ring`.
    pub types: Vec<String>,
    pub camera_ids: Vec<String>,
    pub limit: Option<u32>,
}

impl EventFilter {
    fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(start) = self.start {
            query.push(("start".into(), start.to_string()));
        }
        if let Some(end) = self.end {
            query.push(("end".into(), end.to_string()));
        }
        if !self.types.is_empty() {
            query.push(("types".into(), self.types.join(",")));
        }
        if !self.camera_ids.is_empty() {
            query.push(("cameraIds".into(), self.camera_ids.join(",")));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".into(), limit.to_string()));
        }
        query
    }
}
