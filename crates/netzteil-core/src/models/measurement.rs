//! Measurement frames pushed over streaming endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::PowerSupply;
use crate::error::DeviceResult;

/// Which quantities a stream samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readout {
    Voltage,
    Current,
    Both,
}

impl Readout {
    pub fn includes_voltage(self) -> bool {
        matches!(self, Readout::Voltage | Readout::Both)
    }

    pub fn includes_current(self) -> bool {
        matches!(self, Readout::Current | Readout::Both)
    }
}

/// A single timestamped sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    /// Capture time
    pub time: DateTime<Utc>,
}

/// One frame on a measurement stream: a sample or an in-band error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamFrame {
    Error { error: String },
    Measurement(Measurement),
}

/// Read the requested quantities from one channel.
///
/// The timestamp is taken after the last read completed.
pub async fn sample(
    device: &dyn PowerSupply,
    channel: u32,
    readout: Readout,
) -> DeviceResult<Measurement> {
    let voltage = if readout.includes_voltage() {
        Some(device.get_voltage(channel).await?)
    } else {
        None
    };
    let current = if readout.includes_current() {
        Some(device.get_current(channel).await?)
    } else {
        None
    };

    Ok(Measurement {
        voltage,
        current,
        time: Utc::now(),
    })
}
