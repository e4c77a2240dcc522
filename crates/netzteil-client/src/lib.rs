//! Netzteil Client Library
//!
//! Typed HTTP and WebSocket client for a netzteil power supply gateway.
//!
//! # Example
//!
//! ```rust,no_run
//! use netzteil_client::NetzteilClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = NetzteilClient::new("http://localhost:8000")?;
//!
//!     for (index, ident) in client.list_devices().await?.iter().enumerate() {
//!         println!("{}: {}", index + 1, ident);
//!     }
//!
//!     client.set_voltage(1, 1, 5.0).await?;
//!     client.set_out(1, 1, true).await?;
//!     println!("{} A", client.current(1, 1).await?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module runs a router on an ephemeral port:
//!
//! ```rust,ignore
//! use netzteil_client::testing::TestServer;
//! use netzteil_api::{create_router, AppState};
//!
//! let server = TestServer::start(create_router(state)).await?;
//! let devices = server.client.list_devices().await?;
//! ```

mod client;
mod error;
pub mod streaming;
pub mod testing;

pub use client::NetzteilClient;
pub use error::{NetzteilClientError, Result};
pub use streaming::MeasurementStream;

// Re-export core types for convenience
pub use netzteil_core::{Measurement, Readout, StreamFrame};
