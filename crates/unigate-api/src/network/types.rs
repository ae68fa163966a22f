//! Wire types for the Network Integration API.
//!
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.
//! Nested objects the client never inspects stay opaque `Value`s, and
//! records the API is known to extend carry a flattened `extra` map so
//! nothing is silently dropped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn default_true() -> bool {
    true
}

// ── Application ──────────────────────────────────────────────────────

/// From `GET /info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    pub application_version: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Sites ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub device_count: i64,
    #[serde(default)]
    pub client_count: i64,
    pub country_code: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// Adopted device overview — from `GET /sites/{siteId}/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Uuid,
    pub mac_address: String,
    pub ip_address: Option<String>,
    pub name: String,
    pub model: String,
    /// One of: `ONLINE`, `OFFLINE`, `PENDING_ADOPTION`, `UPDATING`,
    /// `GETTING_READY`, `ADOPTING`, `DELETING`, `CONNECTION_INTERRUPTED`,
    /// `ISOLATED`.
    pub state: String,
    #[serde(default)]
    pub supported: bool,
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub firmware_updatable: bool,
    #[serde(default)]
    pub features: Vec<String>,
    /// Complex nested interfaces object — kept as opaque JSON.
    #[serde(default)]
    pub interfaces: Value,
}

/// Adopted device details — extends the overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetails {
    pub id: Uuid,
    pub mac_address: String,
    pub ip_address: Option<String>,
    pub name: String,
    pub model: String,
    pub state: String,
    #[serde(default)]
    pub supported: bool,
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub firmware_updatable: bool,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub interfaces: Value,
    pub serial_number: Option<String>,
    pub short_name: Option<String>,
    /// ISO 8601 date-time.
    pub startup_timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Clients ──────────────────────────────────────────────────────────

/// A client attached to the network — from `GET /sites/{siteId}/clients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: Option<String>,
    /// One of: `WIRED`, `WIRELESS`, `VPN`, `TELEPORT`.
    #[serde(rename = "type")]
    pub client_type: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    /// Polymorphic access object — carries a `type` discriminator.
    #[serde(default)]
    pub access: Value,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Client {
    /// Best human-readable label for this client.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.mac_address.as_deref())
            .unwrap_or("unknown")
    }
}

// ── Networks ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub vlan_id: Option<i32>,
    pub purpose: Option<String>,
    pub subnet: Option<String>,
    pub gateway_ip: Option<String>,
    #[serde(default = "default_true")]
    pub dhcp_enabled: bool,
    pub dhcp_start: Option<String>,
    pub dhcp_stop: Option<String>,
    pub domain_name: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Request body for creating or replacing a network.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCreateUpdate {
    pub name: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
}

// ── WiFi ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiBroadcast {
    pub id: Uuid,
    pub name: String,
    pub ssid: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Security mode, e.g. `WPA2_PERSONAL`, `WPA3_PERSONAL`, `OPEN`.
    pub security: Option<String>,
    pub network_id: Option<Uuid>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Firewall ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallPolicy {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// `ALLOW`, `BLOCK`, or `REJECT`.
    pub action: Option<String>,
    pub protocol: Option<String>,
    /// Matching criteria — kept opaque, the shapes vary per rule kind.
    #[serde(default)]
    pub source: Value,
    #[serde(default)]
    pub destination: Value,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ── Hotspot vouchers ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    /// Voucher note/label.
    pub name: Option<String>,
    /// Secret activation code for the hotspot portal.
    pub code: String,
    pub authorized_guest_limit: Option<i64>,
    #[serde(default)]
    pub authorized_guest_count: i64,
    pub activated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expired: bool,
    pub time_limit_minutes: Option<i64>,
    #[serde(rename = "dataUsageLimitMBytes")]
    pub data_usage_limit_mbytes: Option<i64>,
    pub rx_rate_limit_kbps: Option<i64>,
    pub tx_rate_limit_kbps: Option<i64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Voucher {
    /// Whether the voucher can still authorize guests.
    pub fn is_active(&self) -> bool {
        if self.expired {
            return false;
        }
        match self.authorized_guest_limit {
            Some(limit) => self.authorized_guest_count < limit,
            None => true,
        }
    }
}

/// Request body for minting vouchers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// How many vouchers to mint.
    pub count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_guest_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<i64>,
    #[serde(rename = "dataUsageLimitMBytes", skip_serializing_if = "Option::is_none")]
    pub data_usage_limit_mbytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_rate_limit_kbps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_rate_limit_kbps: Option<i64>,
}

impl VoucherCreateRequest {
    /// One voucher, no limits.
    pub fn single() -> Self {
        Self {
            name: None,
            count: 1,
            authorized_guest_limit: None,
            time_limit_minutes: None,
            data_usage_limit_mbytes: None,
            rx_rate_limit_kbps: None,
            tx_rate_limit_kbps: None,
        }
    }
}
