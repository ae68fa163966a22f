//! Wire types for the Protect Integration API.
//!
//! Protect identifiers are opaque strings (not UUIDs) and timestamps are
//! epoch milliseconds. Device records are famously wide; each carries a
//! flattened `extra` map for the fields not modeled here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_false() -> bool {
    false
}

// ── Application / sites ──────────────────────────────────────────────

/// From `GET /meta/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    pub application_version: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Cameras ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: String,
    pub name: Option<String>,
    pub mac: Option<String>,
    #[serde(rename = "type")]
    pub camera_type: Option<String>,
    pub model: Option<String>,
    /// `CONNECTED`, `DISCONNECTED`, `CONNECTING`, `ADOPTING`, `UPDATING`.
    pub state: Option<String>,
    pub firmware_version: Option<String>,
    pub uptime: Option<i64>,
    /// Epoch milliseconds.
    pub last_seen: Option<i64>,
    #[serde(default = "default_false")]
    pub is_connected: bool,
    #[serde(default = "default_false")]
    pub is_recording: bool,
    #[serde(default = "default_false")]
    pub is_motion_detected: bool,
    /// `always`, `motion`, `smart`, `schedule`, `never`.
    pub recording_mode: Option<String>,
    pub video_mode: Option<String>,
    pub mic_volume: Option<i64>,
    #[serde(default)]
    pub channels: Vec<Value>,
    #[serde(default)]
    pub feature_flags: Value,
    #[serde(default)]
    pub smart_detect_types: Vec<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Camera {
    /// Best human-readable label for this camera.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.mac.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Partial camera update — only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mic_volume: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdr_mode: Option<bool>,
}

/// Token-based RTSPS stream URLs, one per requested quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtspsStreams {
    pub high: Option<String>,
    pub medium: Option<String>,
    pub low: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Sensors / lights / chimes / viewers ──────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: String,
    pub name: Option<String>,
    pub mac: Option<String>,
    pub state: Option<String>,
    pub is_opened: Option<bool>,
    pub motion_sensitivity: Option<i64>,
    #[serde(default)]
    pub battery_status: Value,
    #[serde(default)]
    pub stats: Value,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Light {
    pub id: String,
    pub name: Option<String>,
    pub mac: Option<String>,
    /// `on`, `off`, or `motion`.
    pub light_mode: Option<String>,
    pub brightness: Option<i64>,
    #[serde(default = "default_false")]
    pub is_light_on: bool,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chime {
    pub id: String,
    pub name: Option<String>,
    pub mac: Option<String>,
    pub volume: Option<i64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub id: String,
    pub name: Option<String>,
    pub mac: Option<String>,
    /// Id of the live view this viewer displays.
    pub liveview: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Live views / NVR ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liveview {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub slots: Vec<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nvr {
    pub id: String,
    pub name: Option<String>,
    pub mac: Option<String>,
    pub version: Option<String>,
    pub firmware_version: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    /// `motion`, `smartDetect`, `ring`, `sensorOpened`, ...
    #[serde(rename = "type")]
    pub event_type: String,
    /// Epoch milliseconds.
    pub start: Option<i64>,
    /// Epoch milliseconds; `None` while the event is still open.
    pub end: Option<i64>,
    pub score: Option<i64>,
    pub camera: Option<String>,
    pub camera_id: Option<String>,
    #[serde(default)]
    pub smart_detect_types: Vec<String>,
    pub thumbnail: Option<String>,
    pub heatmap: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Event {
    /// Event duration in milliseconds, once the event has closed.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

// ── Files ────────────────────────────────────────────────────────────

/// A device asset file (ringtones, chime sounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAssetFile {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn camera_decodes_and_keeps_unknown_fields() {
        let camera: Camera = serde_json::from_value(json!({
            "id": "6683f9e10185f303e4003a5d",
            "name": "Driveway",
            "mac": "AA:BB:CC:11:22:33",
            "type": "UVC G5 Bullet",
            "state": "CONNECTED",
            "isConnected": true,
            "recordingMode": "motion",
            "lastSeen": 1_754_000_000_000_i64,
            "ispSettings": {"brightness": 50}
        }))
        .expect("decodes");
        assert_eq!(camera.display_name(), "Driveway");
        assert!(camera.is_connected);
        assert_eq!(camera.last_seen, Some(1_754_000_000_000));
        assert!(camera.extra.contains_key("ispSettings"));
    }

    #[test]
    fn camera_patch_serializes_only_set_fields() {
        let patch = CameraPatch {
            recording_mode: Some("always".into()),
            ..CameraPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).expect("serializes"),
            json!({"recordingMode": "always"})
        );
    }

    #[test]
    fn event_duration() {
        let event: Event = serde_json::from_value(json!({
            "id": "evt1",
            "type": "motion",
            "start": 1_000,
            "end": 4_500
        }))
        .expect("decodes");
        assert_eq!(event.duration_ms(), Some(3_500));

        let open: Event = serde_json::from_value(json!({
            "id": "evt2",
            "type": "ring",
            "start": 1_000
        }))
        .expect("decodes");
        assert_eq!(open.duration_ms(), None);
    }
}
