//! Device description models

use serde::{Deserialize, Serialize};

/// Static description of a configured device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Operator supplied label (falls back to the model name)
    pub name: String,
    /// Driver model key, e.g. "rnd320"
    pub model: String,
    /// Transport locator as configured, e.g. "tcp://10.0.0.5:5025"
    pub locator: String,
}

impl DeviceInfo {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            locator: locator.into(),
        }
    }
}

/// Regulation mode reported by supplies that expose it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelMode {
    /// Constant voltage
    Cv,
    /// Constant current
    Cc,
}
