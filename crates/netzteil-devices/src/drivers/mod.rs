//! Vendor drivers
//!
//! Each driver composes one of the links from [`crate::transport`] with the
//! command grammar of its instrument family.

pub mod dummy;
pub mod hmc804;
pub mod rnd320;

pub use dummy::SimulatedSupply;
pub use hmc804::Hmc804;
pub use rnd320::Rnd320;

use netzteil_core::{DeviceError, DeviceResult};

/// Setpoints must be finite and non-negative
pub(crate) fn check_setpoint(what: &str, value: f64) -> DeviceResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DeviceError::InvalidArgument(format!(
            "{} setpoint {} out of range",
            what, value
        )));
    }
    Ok(())
}

pub(crate) fn parse_float(reply: &[u8]) -> DeviceResult<f64> {
    let text = String::from_utf8_lossy(reply);
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    text.parse::<f64>()
        .map_err(|_| DeviceError::Protocol(format!("expected a number, got {:?}", text)))
}

/// SCPI booleans: 1/0, ON/OFF, and the spelled out forms
pub(crate) fn parse_bool(reply: &str) -> DeviceResult<bool> {
    match reply.trim().to_ascii_uppercase().as_str() {
        "1" | "ON" | "TRUE" => Ok(true),
        "0" | "OFF" | "FALSE" => Ok(false),
        other => Err(DeviceError::Protocol(format!(
            "expected a boolean, got {:?}",
            other
        ))),
    }
}
