// Endpoint methods for the Network Integration API.
//
// Every method computes a site-scoped endpoint, routes it through the
// device-management addressing for the active connection mode, and
// decodes the unwrapped payload into the wire types.

use serde_json::json;
use uuid::Uuid;

use super::types;
use crate::auth::Credential;
use crate::client::{ApiClient, decode, decode_list, to_body};
use crate::connection::ConnectionContext;
use crate::response::Payload;
use crate::transport::TransportConfig;
use crate::Error;

/// Async client for the UniFi Network Integration API.
///
/// Works identically against a local console and through the cloud
/// connector; the [`ConnectionContext`] decides the addressing. Site
/// scoping is explicit on every call — both modes take the same
/// `site` argument.
#[derive(Debug)]
pub struct NetworkClient {
    api: ApiClient,
}

impl NetworkClient {
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

    fn path(&self, endpoint: &str) -> String {
        self.api.context().network_path(endpoint)
    }

    // ── Application ──────────────────────────────────────────────────

    pub async fn application_info(&self) -> Result<types::ApplicationInfo, Error> {
        let payload = self.api.get(&self.path("/info")).await?;
        decode(payload, "application info")
    }

    /// Cheap probe that authentication and addressing both work.
    pub async fn validate_connection(&self) -> Result<bool, Error> {
        let payload = self.api.get(&self.path("/sites")).await?;
        Ok(!matches!(payload, Payload::Empty))
    }

    // ── Sites ────────────────────────────────────────────────────────

    pub async fn list_sites(&self) -> Result<Vec<types::Site>, Error> {
        let payload = self.api.get(&self.path("/sites")).await?;
        decode_list(payload, "sites")
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn list_devices(&self, site: &Uuid) -> Result<Vec<types::Device>, Error> {
        let payload = self.api.get(&self.path(&format!("/sites/{site}/devices"))).await?;
        decode_list(payload, "devices")
    }

    pub async fn get_device(
        &self,
        site: &Uuid,
        device: &Uuid,
    ) -> Result<types::DeviceDetails, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/sites/{site}/devices/{device}")))
            .await?;
        decode(payload, "device")
    }

    pub async fn restart_device(&self, site: &Uuid, device: &Uuid) -> Result<(), Error> {
        self.api
            .post(
                &self.path(&format!("/sites/{site}/devices/{device}/actions")),
                Some(&json!({ "action": "RESTART" })),
            )
            .await?;
        Ok(())
    }

    pub async fn power_cycle_port(
        &self,
        site: &Uuid,
        device: &Uuid,
        port_idx: u32,
    ) -> Result<(), Error> {
        self.api
            .post(
                &self.path(&format!(
                    "/sites/{site}/devices/{device}/interfaces/ports/{port_idx}/actions"
                )),
                Some(&json!({ "action": "POWER_CYCLE" })),
            )
            .await?;
        Ok(())
    }

    /// Adopt a pending device by MAC address.
    pub async fn adopt_device(
        &self,
        site: &Uuid,
        mac_address: &str,
    ) -> Result<types::DeviceDetails, Error> {
        let payload = self
            .api
            .post(
                &self.path(&format!("/sites/{site}/devices")),
                Some(&json!({ "macAddress": mac_address })),
            )
            .await?;
        decode(payload, "adopted device")
    }

    pub async fn forget_device(&self, site: &Uuid, device: &Uuid) -> Result<(), Error> {
        self.api
            .delete(&self.path(&format!("/sites/{site}/devices/{device}")))
            .await?;
        Ok(())
    }

    // ── Clients ──────────────────────────────────────────────────────

    pub async fn list_clients(&self, site: &Uuid) -> Result<Vec<types::Client>, Error> {
        let payload = self.api.get(&self.path(&format!("/sites/{site}/clients"))).await?;
        decode_list(payload, "clients")
    }

    pub async fn get_client(&self, site: &Uuid, client: &Uuid) -> Result<types::Client, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/sites/{site}/clients/{client}")))
            .await?;
        decode(payload, "client")
    }

    pub async fn authorize_guest(&self, site: &Uuid, client: &Uuid) -> Result<(), Error> {
        self.client_action(site, client, "AUTHORIZE_GUEST_ACCESS").await
    }

    pub async fn unauthorize_guest(&self, site: &Uuid, client: &Uuid) -> Result<(), Error> {
        self.client_action(site, client, "UNAUTHORIZE_GUEST_ACCESS").await
    }

    async fn client_action(&self, site: &Uuid, client: &Uuid, action: &str) -> Result<(), Error> {
        self.api
            .post(
                &self.path(&format!("/sites/{site}/clients/{client}/actions")),
                Some(&json!({ "action": action })),
            )
            .await?;
        Ok(())
    }

    // ── Networks ─────────────────────────────────────────────────────

    pub async fn list_networks(&self, site: &Uuid) -> Result<Vec<types::Network>, Error> {
        let payload = self.api.get(&self.path(&format!("/sites/{site}/networks"))).await?;
        decode_list(payload, "networks")
    }

    pub async fn get_network(&self, site: &Uuid, network: &Uuid) -> Result<types::Network, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/sites/{site}/networks/{network}")))
            .await?;
        decode(payload, "network")
    }

    pub async fn create_network(
        &self,
        site: &Uuid,
        body: &types::NetworkCreateUpdate,
    ) -> Result<types::Network, Error> {
        let payload = self
            .api
            .post(
                &self.path(&format!("/sites/{site}/networks")),
                Some(&to_body(body)?),
            )
            .await?;
        decode(payload, "created network")
    }

    pub async fn update_network(
        &self,
        site: &Uuid,
        network: &Uuid,
        body: &types::NetworkCreateUpdate,
    ) -> Result<types::Network, Error> {
        let payload = self
            .api
            .put(
                &self.path(&format!("/sites/{site}/networks/{network}")),
                Some(&to_body(body)?),
            )
            .await?;
        decode(payload, "updated network")
    }

    pub async fn delete_network(&self, site: &Uuid, network: &Uuid) -> Result<(), Error> {
        self.api
            .delete(&self.path(&format!("/sites/{site}/networks/{network}")))
            .await?;
        Ok(())
    }

    // ── WiFi broadcasts ──────────────────────────────────────────────

    pub async fn list_wifi_broadcasts(
        &self,
        site: &Uuid,
    ) -> Result<Vec<types::WifiBroadcast>, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/sites/{site}/wifi/broadcasts")))
            .await?;
        decode_list(payload, "wifi broadcasts")
    }

    pub async fn get_wifi_broadcast(
        &self,
        site: &Uuid,
        broadcast: &Uuid,
    ) -> Result<types::WifiBroadcast, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/sites/{site}/wifi/broadcasts/{broadcast}")))
            .await?;
        decode(payload, "wifi broadcast")
    }

    pub async fn set_wifi_enabled(
        &self,
        site: &Uuid,
        broadcast: &Uuid,
        enabled: bool,
    ) -> Result<types::WifiBroadcast, Error> {
        let payload = self
            .api
            .patch(
                &self.path(&format!("/sites/{site}/wifi/broadcasts/{broadcast}")),
                Some(&json!({ "enabled": enabled })),
            )
            .await?;
        decode(payload, "wifi broadcast")
    }

    // ── Firewall policies ────────────────────────────────────────────

    pub async fn list_firewall_policies(
        &self,
        site: &Uuid,
    ) -> Result<Vec<types::FirewallPolicy>, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/sites/{site}/firewall/policies")))
            .await?;
        decode_list(payload, "firewall policies")
    }

    pub async fn get_firewall_policy(
        &self,
        site: &Uuid,
        policy: &Uuid,
    ) -> Result<types::FirewallPolicy, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/sites/{site}/firewall/policies/{policy}")))
            .await?;
        decode(payload, "firewall policy")
    }

    pub async fn set_firewall_policy_enabled(
        &self,
        site: &Uuid,
        policy: &Uuid,
        enabled: bool,
    ) -> Result<types::FirewallPolicy, Error> {
        let payload = self
            .api
            .patch(
                &self.path(&format!("/sites/{site}/firewall/policies/{policy}")),
                Some(&json!({ "enabled": enabled })),
            )
            .await?;
        decode(payload, "firewall policy")
    }

    // ── Hotspot vouchers ─────────────────────────────────────────────

    pub async fn list_vouchers(&self, site: &Uuid) -> Result<Vec<types::Voucher>, Error> {
        let payload = self
            .api
            .get(&self.path(&format!("/sites/{site}/hotspot/vouchers")))
            .await?;
        decode_list(payload, "vouchers")
    }

    pub async fn create_vouchers(
        &self,
        site: &Uuid,
        body: &types::VoucherCreateRequest,
    ) -> Result<Vec<types::Voucher>, Error> {
        let payload = self
            .api
            .post(
                &self.path(&format!("/sites/{site}/hotspot/vouchers")),
                Some(&to_body(body)?),
            )
            .await?;
        decode_list(payload, "created vouchers")
    }

    pub async fn delete_voucher(&self, site: &Uuid, voucher: &Uuid) -> Result<(), Error> {
        self.api
            .delete(&self.path(&format!("/sites/{site}/hotspot/vouchers/{voucher}")))
            .await?;
        Ok(())
    }
}
