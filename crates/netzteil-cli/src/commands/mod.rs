//! Command implementations for the netzteil CLI

pub mod devices;
pub mod get;
pub mod set;
pub mod watch;

pub use devices::devices;
pub use get::get;
pub use set::set;
pub use watch::{watch, Quantity};

use anyhow::{bail, Result};
use clap::ValueEnum;

/// Gateway resources reachable through `get` and `set`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Endpoint {
    /// Identification string (read only)
    Ident,
    /// Model specific status object (read only)
    Status,
    /// Number of channels (read only)
    Channels,
    /// Master output switch
    Master,
    /// Key beep (write only)
    Beep,
    /// Channel output; channel 0 is the master output
    Out,
    /// Voltage setpoint in volts
    Voltage,
    /// Current limit in amperes
    Current,
    /// Over-current protection
    Ocp,
    /// Over-voltage protection
    Ovp,
}

impl Endpoint {
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Ident => "ident",
            Endpoint::Status => "status",
            Endpoint::Channels => "channels",
            Endpoint::Master => "master",
            Endpoint::Beep => "beep",
            Endpoint::Out => "out",
            Endpoint::Voltage => "voltage",
            Endpoint::Current => "current",
            Endpoint::Ocp => "ocp",
            Endpoint::Ovp => "ovp",
        }
    }
}

/// A value to write, already typed for its endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setpoint {
    Switch(bool),
    Level(f64),
}

impl Setpoint {
    pub fn parse(endpoint: Endpoint, raw: &str) -> Result<Self> {
        match endpoint {
            Endpoint::Voltage | Endpoint::Current => {
                let value: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("'{}' is not a number", raw))?;
                Ok(Setpoint::Level(value))
            }
            Endpoint::Master | Endpoint::Beep | Endpoint::Out | Endpoint::Ocp | Endpoint::Ovp => {
                parse_switch(raw).map(Setpoint::Switch)
            }
            Endpoint::Ident | Endpoint::Status | Endpoint::Channels => {
                bail!("{} is read only", endpoint.name())
            }
        }
    }
}

/// on/off, true/false or 1/0, any case
pub fn parse_switch(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => bail!("'{}' is not a switch value (on/off, true/false, 1/0)", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_values() {
        for raw in ["on", "ON", "true", "1", " True "] {
            assert!(parse_switch(raw).unwrap(), "{}", raw);
        }
        for raw in ["off", "False", "0"] {
            assert!(!parse_switch(raw).unwrap(), "{}", raw);
        }
        assert!(parse_switch("maybe").is_err());
    }

    #[test]
    fn test_setpoint_follows_endpoint() {
        assert_eq!(
            Setpoint::parse(Endpoint::Voltage, "12.5").unwrap(),
            Setpoint::Level(12.5)
        );
        assert_eq!(
            Setpoint::parse(Endpoint::Out, "off").unwrap(),
            Setpoint::Switch(false)
        );
        assert!(Setpoint::parse(Endpoint::Current, "on").is_err());
        assert!(Setpoint::parse(Endpoint::Ident, "x").is_err());
    }
}
