//! Gateway configuration
//!
//! Deserialized from TOML:
//!
//! ```toml
//! [http]
//! bind = "127.0.0.1:8000"
//!
//! [[devices]]
//! model = "hmc804"
//! handle = "tcp://192.168.1.50:5025"
//! name = "rack"
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RegistryError;

/// Top level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub http: HttpConfig,
    /// Devices in registry order; position n is served as device id n + 1
    #[serde(default, alias = "netzteile")]
    pub devices: Vec<DeviceConfig>,
}

impl GatewayConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Upper bound for a single HTTP request, streams excluded
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// One configured power supply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Driver model key: "dummy", "rnd320" or "hmc804"
    pub model: String,
    /// Transport locator, e.g. "file:///dev/ttyACM0" or "tcp://10.0.0.5:5025"
    #[serde(default)]
    pub handle: String,
    /// Label used in logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Channel count override for models that come in several sizes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
}

impl DeviceConfig {
    pub fn new(model: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            handle: handle.into(),
            name: None,
            channels: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_channels(mut self, channels: u32) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Configured name, or the model key when none was given
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.model)
    }
}

// =============================================================================
// Models
// =============================================================================

/// Supported driver models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// In-memory simulated supply
    Dummy,
    /// RND 320 / KA3005P family over USB serial
    Rnd320,
    /// Rohde & Schwarz HMC804x over TCP
    Hmc804,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Dummy => "dummy",
            Model::Rnd320 => "rnd320",
            Model::Hmc804 => "hmc804",
        }
    }
}

impl FromStr for Model {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dummy" => Ok(Model::Dummy),
            "rnd320" => Ok(Model::Rnd320),
            "hmc804" => Ok(Model::Hmc804),
            _ => Err(RegistryError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Locators
// =============================================================================

/// Parsed transport locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// `file:///dev/ttyACM0` or `serial:///dev/ttyACM0?baud=9600`
    Serial { path: String, baud_rate: Option<u32> },
    /// `tcp://host:port`
    Tcp { target: String },
    /// `dummy://` or no handle at all
    Simulated,
}

impl Locator {
    pub fn parse(handle: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidHandle {
            handle: handle.to_string(),
            reason: reason.to_string(),
        };

        if handle.trim().is_empty() {
            return Ok(Locator::Simulated);
        }

        let url = Url::parse(handle).map_err(|e| invalid(&e.to_string()))?;
        match url.scheme() {
            "file" | "serial" => {
                let path = url.path();
                if path.is_empty() || path == "/" {
                    return Err(invalid("missing device path"));
                }
                let baud_rate = url
                    .query_pairs()
                    .find(|(key, _)| key == "baud")
                    .map(|(_, value)| {
                        value
                            .parse::<u32>()
                            .map_err(|_| invalid("baud must be a positive integer"))
                    })
                    .transpose()?;
                Ok(Locator::Serial {
                    path: path.to_string(),
                    baud_rate,
                })
            }
            "tcp" => {
                let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
                let port = url.port().ok_or_else(|| invalid("missing port"))?;
                Ok(Locator::Tcp {
                    target: format!("{}:{}", host, port),
                })
            }
            "dummy" => Ok(Locator::Simulated),
            other => Err(invalid(&format!("unsupported scheme '{}'", other))),
        }
    }
}
