//! Shared data models for power supply drivers and the gateway

mod device;
mod measurement;

pub use device::*;
pub use measurement::*;
