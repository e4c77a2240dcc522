//! netzteil-devices - Transports and drivers for bench power supplies
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Driver (PowerSupply impl)                │
//! │     dummy        │      rnd320        │      hmc804       │
//! │                  │        │           │        │          │
//! │                  │ PersistentLink     │  SessionLink      │
//! │                  │ (lock, retry,      │  (lock, connect   │
//! │                  │  reopen on EIO)    │   per operation)  │
//! │                  │        │           │        │          │
//! │                  │   framing::*       │   framing::*      │
//! │                  │        │           │        │          │
//! │                  │ SerialConnector    │  TcpConnector     │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod registry;
pub mod retry;
pub mod transport;

pub use config::{DeviceConfig, GatewayConfig, HttpConfig, Locator, Model};
pub use error::RegistryError;
pub use netzteil_core::{DeviceError, DeviceResult, PowerSupply, Registry};
pub use registry::{build_device, build_registry};
pub use retry::RetryPolicy;
pub use transport::TransportError;
