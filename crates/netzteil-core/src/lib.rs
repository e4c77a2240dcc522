//! netzteil-core - Core traits and types for the power supply gateway
//!
//! Drivers implement [`PowerSupply`]; the gateway addresses them through a
//! [`Registry`]. Neither side knows about the other's transport or HTTP details.

pub mod device;
pub mod error;
pub mod models;
pub mod registry;

pub use device::{check_channel, PowerSupply};
pub use error::{DeviceError, DeviceResult};
pub use models::*;
pub use registry::{ChannelTarget, Registry};
