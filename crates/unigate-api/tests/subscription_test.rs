// Subscription channel tests against a loopback WebSocket server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use unigate_api::{
    ChannelState, ConnectionContext, Credential, ProtectClient, ReconnectPolicy, SubscriptionKind,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Serve `connections` WebSocket sessions, sending each its frame list
/// and then closing. Returns the base URI and the server task handle.
async fn ws_server(connections: Vec<Vec<Message>>) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        for frames in connections {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            for frame in frames {
                if ws.send(frame).await.is_err() {
                    return;
                }
            }
            let _ = ws.close(None).await;
        }
    });

    (format!("http://{addr}"), handle)
}

fn protect_client(uri: &str) -> ProtectClient {
    let context = ConnectionContext::local(uri).unwrap();
    ProtectClient::new(Credential::local("test-key", true), context)
}

// ── Scoped stream mode ──────────────────────────────────────────────

#[tokio::test]
async fn malformed_frames_are_dropped_and_valid_ones_delivered() {
    let (uri, server) = ws_server(vec![vec![
        Message::text("not json at all"),
        Message::text(r#"{"type": "motion", "camera": "cam1"}"#),
        Message::text("{{{"),
        Message::text(r#"{"type": "ring"}"#),
    ]])
    .await;

    let client = protect_client(&uri);
    let channel = client.subscription(SubscriptionKind::Events, None).unwrap();

    let stream = channel.stream().await.unwrap();
    let messages: Vec<serde_json::Value> = stream.collect().await;

    assert_eq!(messages.len(), 2, "only the two valid frames survive");
    assert_eq!(messages[0]["type"], "motion");
    assert_eq!(messages[1]["type"], "ring");
    assert_eq!(channel.state(), ChannelState::Idle);

    server.await.unwrap();
}

#[tokio::test]
async fn scoped_stream_ends_on_disconnect_without_reconnecting() {
    let (uri, server) = ws_server(vec![vec![Message::text(r#"{"seq": 1}"#)]]).await;

    let client = protect_client(&uri);
    let channel = client.subscription(SubscriptionKind::Devices, None).unwrap();

    let stream = channel.stream().await.unwrap();
    let messages: Vec<serde_json::Value> = stream.collect().await;
    assert_eq!(messages.len(), 1);

    // The server served exactly one connection; a reconnect attempt
    // would hang on accept, so reaching here proves there was none.
    server.await.unwrap();
    assert_eq!(channel.state(), ChannelState::Idle);
}

// ── Callback mode ───────────────────────────────────────────────────

#[tokio::test]
async fn stop_from_callback_exits_without_reconnect() {
    // One connection: a message, then silence. stop() from the callback
    // must end the loop well before the reconnect delay could.
    let (uri, _server) = ws_server(vec![vec![
        Message::text(r#"{"seq": 1}"#),
        Message::text(r#"{"seq": 2}"#),
    ]])
    .await;

    let client = protect_client(&uri);
    let channel = client.subscription(SubscriptionKind::Events, None).unwrap();

    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    let stopper = channel.clone();

    let policy = ReconnectPolicy {
        enabled: true,
        delay: Duration::from_secs(60),
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        channel
            .subscribe_with_callback(policy, move |_message| {
                counter.fetch_add(1, Ordering::SeqCst);
                stopper.stop();
            })
            .await;
    })
    .await
    .expect("stop() must end the loop promptly, not after the reconnect delay");

    assert_eq!(received.load(Ordering::SeqCst), 1, "stopped after first delivery");
    assert!(!channel.is_running());
    assert_eq!(channel.state(), ChannelState::Idle);
}

#[tokio::test]
async fn callback_mode_reconnects_after_disconnect() {
    // Two connections, one message each; the channel must bridge the
    // disconnect in between.
    let (uri, server) = ws_server(vec![
        vec![Message::text(r#"{"seq": 1}"#)],
        vec![Message::text(r#"{"seq": 2}"#)],
    ])
    .await;

    let client = protect_client(&uri);
    let channel = client.subscription(SubscriptionKind::Events, None).unwrap();

    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    let stopper = channel.clone();

    let policy = ReconnectPolicy {
        enabled: true,
        delay: Duration::from_millis(50),
    };

    tokio::time::timeout(Duration::from_secs(10), async {
        channel
            .subscribe_with_callback(policy, move |_message| {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                    stopper.stop();
                }
            })
            .await;
    })
    .await
    .expect("second message must arrive through the reconnect");

    assert_eq!(received.load(Ordering::SeqCst), 2);
    server.await.unwrap();
}

#[tokio::test]
async fn disabled_reconnect_ends_after_first_disconnect() {
    let (uri, server) = ws_server(vec![vec![Message::text(r#"{"seq": 1}"#)]]).await;

    let client = protect_client(&uri);
    let channel = client.subscription(SubscriptionKind::Events, None).unwrap();

    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);

    tokio::time::timeout(Duration::from_secs(5), async {
        channel
            .subscribe_with_callback(ReconnectPolicy::disabled(), move |_message| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;
    })
    .await
    .expect("must return after the first disconnect");

    assert_eq!(received.load(Ordering::SeqCst), 1);
    assert_eq!(channel.state(), ChannelState::Idle);
    server.await.unwrap();
}

// ── Handshake ───────────────────────────────────────────────────────

#[tokio::test]
async fn handshake_carries_credential_headers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = std::sync::mpsc::channel::<Option<String>>();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |req: &tokio_tungstenite::tungstenite::handshake::server::Request,
                             resp: tokio_tungstenite::tungstenite::handshake::server::Response| {
            let key = req
                .headers()
                .get("X-API-Key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            tx.send(key).unwrap();
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback).await.unwrap();
        let _ = ws.close(None).await;
    });

    let client = protect_client(&format!("http://{addr}"));
    let channel = client.subscription(SubscriptionKind::Devices, None).unwrap();
    let stream = channel.stream().await.unwrap();
    let _messages: Vec<serde_json::Value> = stream.collect().await;

    assert_eq!(rx.recv().unwrap().as_deref(), Some("test-key"));
    server.await.unwrap();
}
