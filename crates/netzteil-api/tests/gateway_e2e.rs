//! End-to-end tests for the gateway router
//!
//! Status codes, redirects and WebSocket frames are checked on the wire with
//! raw reqwest and tokio-tungstenite; the typed client covers the happy paths
//! in its own test suite.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use netzteil_api::{create_router, AppState};
use netzteil_client::testing::TestServer;
use netzteil_core::{DeviceError, DeviceInfo, DeviceResult, PowerSupply, Registry};
use netzteil_devices::drivers::SimulatedSupply;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

// =============================================================================
// Test devices
// =============================================================================

/// One channel, ident and voltage only. The first `failures` voltage reads fail.
struct FlakySupply {
    info: DeviceInfo,
    failures: AtomicUsize,
    ident_fails: bool,
}

impl FlakySupply {
    fn new(failures: usize) -> Self {
        Self {
            info: DeviceInfo::new("flaky", "test", "test://flaky"),
            failures: AtomicUsize::new(failures),
            ident_fails: false,
        }
    }

    fn silent() -> Self {
        Self {
            ident_fails: true,
            ..Self::new(0)
        }
    }
}

#[async_trait]
impl PowerSupply for FlakySupply {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn probe(&self) -> DeviceResult<()> {
        Ok(())
    }

    async fn get_ident(&self) -> DeviceResult<String> {
        if self.ident_fails {
            return Err(DeviceError::Timeout);
        }
        Ok("test,flaky,0,1".to_string())
    }

    async fn get_channels(&self) -> DeviceResult<u32> {
        Ok(1)
    }

    async fn get_voltage(&self, _channel: u32) -> DeviceResult<f64> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(DeviceError::Transport("Input/output error".to_string()));
        }
        Ok(5.0)
    }
}

/// Never answers a voltage read in reasonable time
struct StuckSupply {
    info: DeviceInfo,
}

#[async_trait]
impl PowerSupply for StuckSupply {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn probe(&self) -> DeviceResult<()> {
        Ok(())
    }

    async fn get_ident(&self) -> DeviceResult<String> {
        Ok("test,stuck,0,1".to_string())
    }

    async fn get_channels(&self) -> DeviceResult<u32> {
        Ok(1)
    }

    async fn get_voltage(&self, _channel: u32) -> DeviceResult<f64> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(0.0)
    }
}

/// Two channels. Every driver call except `get_channels` is counted.
struct CountingSupply {
    info: DeviceInfo,
    calls: AtomicUsize,
}

impl CountingSupply {
    fn new() -> Self {
        Self {
            info: DeviceInfo::new("counting", "test", "test://counting"),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PowerSupply for CountingSupply {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn probe(&self) -> DeviceResult<()> {
        Ok(())
    }

    async fn get_ident(&self) -> DeviceResult<String> {
        self.hit();
        Ok("test,counting,0,1".to_string())
    }

    async fn get_master(&self) -> DeviceResult<bool> {
        self.hit();
        Ok(true)
    }

    async fn set_master(&self, _enabled: bool) -> DeviceResult<()> {
        self.hit();
        Ok(())
    }

    async fn get_channels(&self) -> DeviceResult<u32> {
        Ok(2)
    }

    async fn get_voltage(&self, _channel: u32) -> DeviceResult<f64> {
        self.hit();
        Ok(12.0)
    }

    async fn set_voltage(&self, _channel: u32, _volts: f64) -> DeviceResult<()> {
        self.hit();
        Ok(())
    }

    async fn get_current(&self, _channel: u32) -> DeviceResult<f64> {
        self.hit();
        Ok(0.25)
    }

    async fn set_current(&self, _channel: u32, _amps: f64) -> DeviceResult<()> {
        self.hit();
        Ok(())
    }

    async fn get_out(&self, _channel: u32) -> DeviceResult<bool> {
        self.hit();
        Ok(false)
    }

    async fn set_out(&self, _channel: u32, _enabled: bool) -> DeviceResult<()> {
        self.hit();
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn dummy(channels: u32) -> Arc<dyn PowerSupply> {
    Arc::new(SimulatedSupply::new(
        DeviceInfo::new("dummy", "dummy", "dummy://"),
        channels,
    ))
}

async fn serve(devices: Vec<Arc<dyn PowerSupply>>) -> TestServer {
    TestServer::start(create_router(AppState::new(Registry::new(devices))))
        .await
        .expect("start server")
}

fn no_redirects() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

async fn error_message(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("JSON error envelope");
    body["error"].as_str().expect("error field").to_string()
}

// =============================================================================
// Status codes
// =============================================================================

#[tokio::test]
async fn test_setter_replies_no_content() {
    let server = serve(vec![dummy(3)]).await;
    let http = reqwest::Client::new();
    let url = format!("{}/api/devices/1/channels/2/voltage", server.base_url());

    let response = http.put(&url).json(&7.5).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let value: f64 = http.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(value, 7.5);
}

#[tokio::test]
async fn test_body_without_content_type_is_accepted() {
    let server = serve(vec![dummy(1)]).await;
    let url = format!("{}/api/devices/1/channels/1/out", server.base_url());

    let response = reqwest::Client::new()
        .put(&url)
        .body("false")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!server.client.out(1, 1).await.unwrap());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = serve(vec![dummy(1)]).await;
    let url = format!("{}/api/devices/1/channels/1/voltage", server.base_url());

    let response = reqwest::Client::new()
        .put(&url)
        .body("twelve volts")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("Invalid JSON body"));

    // Type mismatch is a malformed body too
    let response = reqwest::Client::new()
        .put(&url)
        .json(&true)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_path_is_bad_request() {
    let server = serve(vec![dummy(1)]).await;
    let url = format!("{}/api/devices/first/ident", server.base_url());

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!error_message(response).await.is_empty());
}

#[tokio::test]
async fn test_addressing_errors_are_not_found() {
    let server = serve(vec![dummy(2)]).await;

    for path in [
        "/api/devices/2/ident",
        "/api/devices/0/ident",
        "/api/devices/1/channels/3/voltage",
        "/api/devices/1/channels/0/current",
    ] {
        let response = reqwest::get(format!("{}{}", server.base_url(), path))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        assert!(!error_message(response).await.is_empty(), "{}", path);
    }
}

#[tokio::test]
async fn test_addressing_errors_never_reach_the_driver() {
    let device = Arc::new(CountingSupply::new());
    let server = serve(vec![device.clone()]).await;
    let http = reqwest::Client::new();

    for path in [
        "/api/devices/2/ident",
        "/api/devices/0/out",
        "/api/devices/2/channels/1/voltage",
        "/api/devices/1/channels/3/voltage",
        "/api/devices/1/channels/3/out",
        "/api/devices/1/channels/0/current",
    ] {
        let url = format!("{}{}", server.base_url(), path);

        let response = http.get(&url).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", path);

        let body = if path.ends_with("out") {
            serde_json::json!(true)
        } else {
            serde_json::json!(1.0)
        };
        let response = http.put(&url).json(&body).send().await.unwrap();
        assert!(response.status().is_client_error(), "PUT {}", path);
    }

    let response = http
        .get(format!(
            "{}/api/devices/1/channels/5/measurements/ws",
            server.base_url()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(device.calls(), 0);
}

#[tokio::test]
async fn test_missing_capability_is_not_implemented() {
    let server = serve(vec![Arc::new(FlakySupply::new(0))]).await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{}/api/devices/1/channels/1/ocp", server.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert!(error_message(response).await.contains("get_ocp"));

    let response = http
        .put(format!("{}/api/devices/1/out", server.base_url()))
        .json(&true)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_transport_failure_is_service_unavailable() {
    let server = serve(vec![Arc::new(FlakySupply::new(1))]).await;
    let url = format!("{}/api/devices/1/channels/1/voltage", server.base_url());

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_slow_device_hits_request_timeout() {
    let device: Arc<dyn PowerSupply> = Arc::new(StuckSupply {
        info: DeviceInfo::new("stuck", "test", "test://stuck"),
    });
    let state = AppState::new(Registry::new(vec![device]))
        .with_request_timeout(Duration::from_millis(100));
    let server = TestServer::start(create_router(state)).await.unwrap();

    let response = reqwest::get(format!(
        "{}/api/devices/1/channels/1/voltage",
        server.base_url()
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(error_message(response).await, "Request timed out");
}

#[tokio::test]
async fn test_device_list_keeps_positions() {
    let server = serve(vec![dummy(1), Arc::new(FlakySupply::silent()), dummy(2)]).await;

    let devices = server.client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 3);
    assert!(!devices[0].is_empty());
    assert_eq!(devices[1], "");
    assert!(!devices[2].is_empty());
}

#[tokio::test]
async fn test_device_output_switch() {
    let server = serve(vec![dummy(2)]).await;
    let http = reqwest::Client::new();
    let url = format!("{}/api/devices/1/out", server.base_url());

    let response = http.get(&url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.json::<bool>().await.unwrap());

    let response = http.put(&url).json(&false).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!http.get(&url).send().await.unwrap().json::<bool>().await.unwrap());

    // Channel 0 and the typed client address the same switch
    assert!(!server.client.out(1, 0).await.unwrap());
    server.client.set_master(1, true).await.unwrap();
    assert!(server.client.master(1).await.unwrap());
}

// =============================================================================
// Reduced API
// =============================================================================

#[tokio::test]
async fn test_single_device_redirect() {
    let server = serve(vec![dummy(1)]).await;

    let response = no_redirects()
        .get(format!("{}/api/device/ident", server.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.headers()["location"], "/api/devices/1/ident");
}

#[tokio::test]
async fn test_single_device_redirect_needs_exactly_one_device() {
    let server = serve(vec![dummy(1), dummy(1)]).await;

    let response = no_redirects()
        .get(format!("{}/api/device/ident", server.base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_single_channel_redirect_keeps_query() {
    let server = serve(vec![dummy(1), dummy(1)]).await;

    let response = no_redirects()
        .get(format!(
            "{}/api/devices/2/channel/voltage/ws?interval=50",
            server.base_url()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(
        response.headers()["location"],
        "/api/devices/2/channels/1/voltage/ws?interval=50"
    );
}

#[tokio::test]
async fn test_reduced_device_output_follows_through() {
    let server = serve(vec![dummy(1)]).await;
    let http = reqwest::Client::new();
    let url = format!("{}/api/device/out", server.base_url());

    let response = http.put(&url).json(&false).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = http.get(&url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.json::<bool>().await.unwrap());
}

#[tokio::test]
async fn test_reduced_put_follows_through() {
    let server = serve(vec![dummy(1)]).await;

    // 308 keeps method and body, so both hops land on the real setter
    let response = reqwest::Client::new()
        .put(format!("{}/api/device/channel/current", server.base_url()))
        .json(&1.5)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(server.client.current(1, 1).await.unwrap(), 1.5);
}

// =============================================================================
// Streams
// =============================================================================

#[tokio::test]
async fn test_stream_reports_error_then_recovers() {
    let server = serve(vec![Arc::new(FlakySupply::new(1))]).await;
    let url = format!(
        "{}/api/devices/1/channels/1/voltage/ws?interval=20",
        server.ws_url()
    );

    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let mut frames = Vec::new();
    while frames.len() < 3 {
        let message = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame in time")
            .expect("socket open")
            .unwrap();
        if let Message::Text(text) = message {
            frames.push(serde_json::from_str::<Value>(&text).unwrap());
        }
    }

    assert!(frames[0]["error"]
        .as_str()
        .unwrap()
        .contains("Input/output error"));
    for frame in &frames[1..] {
        assert_eq!(frame["voltage"], 5.0);
        assert!(frame.get("current").is_none());
        assert!(frame["time"].is_string());
    }

    socket.close(None).await.unwrap();
}

#[tokio::test]
async fn test_stream_stops_polling_after_disconnect() {
    let device = Arc::new(CountingSupply::new());
    let server = serve(vec![device.clone()]).await;
    let url = format!(
        "{}/api/devices/1/channels/2/voltage/ws?interval=20",
        server.ws_url()
    );

    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    let mut received = 0;
    while received < 3 {
        let message = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame in time")
            .expect("socket open")
            .unwrap();
        if message.is_text() {
            received += 1;
        }
    }
    drop(socket);

    // Give the server a few intervals to notice the hang up
    tokio::time::sleep(Duration::from_millis(200)).await;
    let settled = device.calls();
    assert!(settled >= 3);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(device.calls(), settled);
}

#[tokio::test]
async fn test_stream_address_checked_before_upgrade() {
    let server = serve(vec![dummy(1)]).await;

    let response = reqwest::get(format!(
        "{}/api/devices/4/channels/1/measurements/ws",
        server.base_url()
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Valid address but no upgrade headers
    let response = reqwest::get(format!(
        "{}/api/devices/1/channels/1/measurements/ws",
        server.base_url()
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stream_bad_interval_is_bad_request() {
    let server = serve(vec![dummy(1)]).await;

    let response = reqwest::get(format!(
        "{}/api/devices/1/channels/1/voltage/ws?interval=soon",
        server.base_url()
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
