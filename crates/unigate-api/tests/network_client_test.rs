// Integration tests for `NetworkClient` using wiremock.

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use unigate_api::network::types::{NetworkCreateUpdate, VoucherCreateRequest};
use unigate_api::{ConnectionContext, Credential, Error, NetworkClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_local() -> (MockServer, NetworkClient) {
    let server = MockServer::start().await;
    let context = ConnectionContext::local(&server.uri()).unwrap();
    let client = NetworkClient::new(Credential::local("test-key", true), context);
    (server, client)
}

async fn setup_remote() -> (MockServer, NetworkClient) {
    let server = MockServer::start().await;
    let context = ConnectionContext::remote_with_base(&server.uri(), "console-1").unwrap();
    let client = NetworkClient::new(Credential::api_key("cloud-key"), context);
    (server, client)
}

// ── Addressing & headers ────────────────────────────────────────────

#[tokio::test]
async fn local_requests_use_integration_prefix_and_send_api_key() {
    let (server, client) = setup_local().await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/integration/v1/sites"))
        .and(header("X-API-Key", "test-key"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let sites = client.list_sites().await.unwrap();
    assert!(sites.is_empty());
}

#[tokio::test]
async fn remote_requests_address_the_console() {
    let (server, client) = setup_remote().await;
    let site = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/connector/consoles/console-1/proxy/network/integration/v1/sites/{site}/devices"
        )))
        .and(header("X-API-Key", "cloud-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_devices(&site).await.unwrap();
    assert!(devices.is_empty());
}

// ── Happy paths & envelope unwrap ───────────────────────────────────

#[tokio::test]
async fn enveloped_device_list_decodes() {
    let (server, client) = setup_local().await;
    let site = Uuid::new_v4();
    let device_id = Uuid::new_v4();

    let body = json!({
        "data": [{
            "id": device_id,
            "macAddress": "aa:bb:cc:dd:ee:ff",
            "ipAddress": "192.168.1.10",
            "name": "Office Switch",
            "model": "USW-Lite-8",
            "state": "ONLINE",
            "supported": true,
            "firmwareVersion": "7.1.26",
            "firmwareUpdatable": false,
            "features": ["switching"],
            "interfaces": {}
        }]
    });

    Mock::given(method("GET"))
        .and(path(format!(
            "/proxy/network/integration/v1/sites/{site}/devices"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let devices = client.list_devices(&site).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, device_id);
    assert_eq!(devices[0].name, "Office Switch");
}

#[tokio::test]
async fn bare_list_decodes_identically() {
    let (server, client) = setup_local().await;
    let site = Uuid::new_v4();

    let body = json!([{
        "id": Uuid::new_v4(),
        "name": "Guest WiFi",
        "ssid": "Guest",
        "enabled": true,
        "security": "WPA2_PERSONAL"
    }]);

    Mock::given(method("GET"))
        .and(path(format!(
            "/proxy/network/integration/v1/sites/{site}/wifi/broadcasts"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let broadcasts = client.list_wifi_broadcasts(&site).await.unwrap();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].ssid.as_deref(), Some("Guest"));
}

#[tokio::test]
async fn create_network_posts_body_and_decodes_response() {
    let (server, client) = setup_local().await;
    let site = Uuid::new_v4();
    let network_id = Uuid::new_v4();

    let request = NetworkCreateUpdate {
        name: "IoT VLAN".into(),
        enabled: true,
        vlan_id: Some(30),
        purpose: Some("corporate".into()),
        subnet: None,
    };

    Mock::given(method("POST"))
        .and(path(format!(
            "/proxy/network/integration/v1/sites/{site}/networks"
        )))
        .and(body_json(json!({
            "name": "IoT VLAN",
            "enabled": true,
            "vlanId": 30,
            "purpose": "corporate"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": network_id,
                "name": "IoT VLAN",
                "enabled": true,
                "vlanId": 30
            }
        })))
        .mount(&server)
        .await;

    let network = client.create_network(&site, &request).await.unwrap();
    assert_eq!(network.id, network_id);
    assert_eq!(network.vlan_id, Some(30));
}

#[tokio::test]
async fn restart_device_accepts_empty_success() {
    let (server, client) = setup_local().await;
    let site = Uuid::new_v4();
    let device = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path(format!(
            "/proxy/network/integration/v1/sites/{site}/devices/{device}/actions"
        )))
        .and(body_json(json!({ "action": "RESTART" })))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.restart_device(&site, &device).await.unwrap();
}

#[tokio::test]
async fn create_vouchers_round_trip() {
    let (server, client) = setup_local().await;
    let site = Uuid::new_v4();

    let request = VoucherCreateRequest {
        count: 2,
        time_limit_minutes: Some(480),
        ..VoucherCreateRequest::single()
    };

    Mock::given(method("POST"))
        .and(path(format!(
            "/proxy/network/integration/v1/sites/{site}/hotspot/vouchers"
        )))
        .and(body_json(json!({ "count": 2, "timeLimitMinutes": 480 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": Uuid::new_v4(), "code": "11111-22222", "timeLimitMinutes": 480 },
                { "id": Uuid::new_v4(), "code": "33333-44444", "timeLimitMinutes": 480 }
            ]
        })))
        .mount(&server)
        .await;

    let vouchers = client.create_vouchers(&site, &request).await.unwrap();
    assert_eq!(vouchers.len(), 2);
    assert!(vouchers.iter().all(|v| v.is_active()));
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn status_401_is_authentication() {
    let (server, client) = setup_local().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let err = client.list_sites().await.unwrap_err();
    assert!(err.is_auth(), "expected Authentication, got {err:?}");
}

#[tokio::test]
async fn status_403_is_authentication() {
    let (server, client) = setup_local().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let err = client.list_sites().await.unwrap_err();
    assert!(err.is_auth(), "expected Authentication, got {err:?}");
}

#[tokio::test]
async fn status_404_carries_status_and_body() {
    let (server, client) = setup_local().await;
    let site = Uuid::new_v4();
    let device = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!(
            "/proxy/network/integration/v1/sites/{site}/devices/{device}"
        )))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such device"))
        .mount(&server)
        .await;

    match client.get_device(&site, &device).await {
        Err(Error::NotFound { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such device");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn status_429_reads_retry_after() {
    let (server, client) = setup_local().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "30")
                .set_body_string("Too Many Requests"),
        )
        .mount(&server)
        .await;

    match client.list_sites().await {
        Err(Error::RateLimited {
            retry_after_secs, ..
        }) => assert_eq!(retry_after_secs, 30),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn status_429_without_header_uses_default() {
    let (server, client) = setup_local().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    match client.list_sites().await {
        Err(Error::RateLimited {
            retry_after_secs, ..
        }) => assert_eq!(retry_after_secs, 60),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn status_500_is_rejected_with_body() {
    let (server, client) = setup_local().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    match client.list_sites().await {
        Err(Error::Rejected { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_decodes_as_empty_list() {
    let (server, client) = setup_local().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK, queued"))
        .mount(&server)
        .await;

    let sites = client.list_sites().await.unwrap();
    assert!(sites.is_empty());
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn closed_client_refuses_requests() {
    let (_server, client) = setup_local().await;

    client.close();
    assert!(client.closed());

    let err = client.list_sites().await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }), "got {err:?}");
}

#[tokio::test]
async fn unreachable_host_is_connection_error() {
    // Port 9 (discard) on localhost is reliably refused.
    let context = ConnectionContext::local("http://127.0.0.1:9").unwrap();
    let client = NetworkClient::new(Credential::local("k", true), context);

    let err = client.list_sites().await.unwrap_err();
    assert!(
        matches!(err, Error::Connection { .. } | Error::Timeout { .. }),
        "got {err:?}"
    );
}
