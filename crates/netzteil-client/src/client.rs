//! Netzteil HTTP client implementation

use std::time::Duration;

use netzteil_core::Readout;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{NetzteilClientError, Result};
use crate::streaming::MeasurementStream;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error envelope returned by the gateway
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// REST client for a netzteil gateway
///
/// Device ids and channels are 1-based, as on the wire.
#[derive(Debug, Clone)]
pub struct NetzteilClient {
    client: Client,
    base_url: Url,
}

impl NetzteilClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the gateway (e.g., "http://localhost:8000")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // Health Check
    // =========================================================================

    /// Check server health
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String> {
        let url = self.base_url.join("/health")?;
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(extract_error(response).await)
        }
    }

    // =========================================================================
    // Device Operations
    // =========================================================================

    /// Identity strings of all devices, in id order
    #[instrument(skip(self))]
    pub async fn list_devices(&self) -> Result<Vec<String>> {
        self.get_json("/api/devices").await
    }

    #[instrument(skip(self))]
    pub async fn ident(&self, device: u32) -> Result<String> {
        self.get_json(&format!("/api/devices/{}/ident", device)).await
    }

    /// Free-form status object; its shape depends on the model
    #[instrument(skip(self))]
    pub async fn status(&self, device: u32) -> Result<serde_json::Value> {
        self.get_json(&format!("/api/devices/{}/status", device)).await
    }

    #[instrument(skip(self))]
    pub async fn channels(&self, device: u32) -> Result<u32> {
        self.get_json(&format!("/api/devices/{}/channels", device)).await
    }

    #[instrument(skip(self))]
    pub async fn master(&self, device: u32) -> Result<bool> {
        self.get_json(&format!("/api/devices/{}/out", device)).await
    }

    #[instrument(skip(self))]
    pub async fn set_master(&self, device: u32, enabled: bool) -> Result<()> {
        self.put_json(&format!("/api/devices/{}/out", device), &enabled).await
    }

    #[instrument(skip(self))]
    pub async fn set_beep(&self, device: u32, enabled: bool) -> Result<()> {
        self.put_json(&format!("/api/devices/{}/beep", device), &enabled).await
    }

    // =========================================================================
    // Channel Operations
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn voltage(&self, device: u32, channel: u32) -> Result<f64> {
        self.get_json(&channel_path(device, channel, "voltage")).await
    }

    #[instrument(skip(self))]
    pub async fn set_voltage(&self, device: u32, channel: u32, volts: f64) -> Result<()> {
        self.put_json(&channel_path(device, channel, "voltage"), &volts).await
    }

    #[instrument(skip(self))]
    pub async fn current(&self, device: u32, channel: u32) -> Result<f64> {
        self.get_json(&channel_path(device, channel, "current")).await
    }

    #[instrument(skip(self))]
    pub async fn set_current(&self, device: u32, channel: u32, amps: f64) -> Result<()> {
        self.put_json(&channel_path(device, channel, "current"), &amps).await
    }

    /// Output state; channel 0 reads the master output
    #[instrument(skip(self))]
    pub async fn out(&self, device: u32, channel: u32) -> Result<bool> {
        self.get_json(&channel_path(device, channel, "out")).await
    }

    #[instrument(skip(self))]
    pub async fn set_out(&self, device: u32, channel: u32, enabled: bool) -> Result<()> {
        self.put_json(&channel_path(device, channel, "out"), &enabled).await
    }

    #[instrument(skip(self))]
    pub async fn ocp(&self, device: u32, channel: u32) -> Result<bool> {
        self.get_json(&channel_path(device, channel, "ocp")).await
    }

    #[instrument(skip(self))]
    pub async fn set_ocp(&self, device: u32, channel: u32, enabled: bool) -> Result<()> {
        self.put_json(&channel_path(device, channel, "ocp"), &enabled).await
    }

    #[instrument(skip(self))]
    pub async fn ovp(&self, device: u32, channel: u32) -> Result<bool> {
        self.get_json(&channel_path(device, channel, "ovp")).await
    }

    #[instrument(skip(self))]
    pub async fn set_ovp(&self, device: u32, channel: u32, enabled: bool) -> Result<()> {
        self.put_json(&channel_path(device, channel, "ovp"), &enabled).await
    }

    // =========================================================================
    // Streaming
    // =========================================================================

    /// WebSocket URL of a measurement stream
    pub fn stream_url(
        &self,
        device: u32,
        channel: u32,
        readout: Readout,
        interval: Option<Duration>,
    ) -> Result<Url> {
        let resource = match readout {
            Readout::Voltage => "voltage",
            Readout::Current => "current",
            Readout::Both => "measurements",
        };
        let mut url = self
            .base_url
            .join(&format!("{}/ws", channel_path(device, channel, resource)))?;

        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|_| {
            NetzteilClientError::StreamError(format!("Cannot use {} for WebSocket", url))
        })?;

        if let Some(interval) = interval {
            url.query_pairs_mut()
                .append_pair("interval", &interval.as_millis().to_string());
        }

        Ok(url)
    }

    /// Open a measurement stream on one channel
    #[instrument(skip(self))]
    pub async fn stream(
        &self,
        device: u32,
        channel: u32,
        readout: Readout,
        interval: Option<Duration>,
    ) -> Result<MeasurementStream> {
        let url = self.stream_url(device, channel, readout, interval)?;
        MeasurementStream::connect(url).await
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path)?;
        debug!(%url, "GET");

        let response = self.client.get(url).send().await?;
        handle_response(response).await
    }

    async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.base_url.join(path)?;
        debug!(%url, "PUT");

        let response = self.client.put(url).json(body).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(extract_error(response).await)
        }
    }
}

fn channel_path(device: u32, channel: u32, resource: &str) -> String {
    format!("/api/devices/{}/channels/{}/{}", device, channel, resource)
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if response.status().is_success() {
        response
            .json()
            .await
            .map_err(|e| NetzteilClientError::ParseError(e.to_string()))
    } else {
        Err(extract_error(response).await)
    }
}

async fn extract_error(response: reqwest::Response) -> NetzteilClientError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(err) => err.error,
        Err(_) => format!("HTTP {}", status),
    };

    if status == StatusCode::REQUEST_TIMEOUT {
        return NetzteilClientError::Timeout(message);
    }
    NetzteilClientError::from_status(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = NetzteilClient::new("http://localhost:8000");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = NetzteilClient::new("not a url");
        assert!(client.is_err());
    }

    #[test]
    fn test_stream_url() {
        let client = NetzteilClient::new("http://localhost:8000").unwrap();

        let url = client
            .stream_url(1, 2, Readout::Voltage, Some(Duration::from_millis(100)))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:8000/api/devices/1/channels/2/voltage/ws?interval=100"
        );

        let url = client.stream_url(3, 1, Readout::Both, None).unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:8000/api/devices/3/channels/1/measurements/ws"
        );
    }

    #[test]
    fn test_secure_stream_url() {
        let client = NetzteilClient::new("https://bench.local").unwrap();
        let url = client.stream_url(1, 1, Readout::Current, None).unwrap();
        assert_eq!(url.scheme(), "wss");
    }
}
