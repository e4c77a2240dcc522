//! Transport layer for power supply communication
//!
//! - [`framing`]: send / request-line / request-until-idle primitives
//! - [`PersistentLink`]: one long lived handle (USB serial) with retry and reopen
//! - [`SessionLink`]: connect, send, disconnect per operation (single-socket TCP instruments)
//! - [`SerialConnector`] and [`TcpConnector`] open the real handles, [`mock`] fakes them
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use netzteil_devices::transport::{PersistentLink, SerialConnector};
//! use netzteil_devices::retry::RetryPolicy;
//!
//! let connector = Arc::new(SerialConnector::new("/dev/ttyACM0", 9600));
//! let link = PersistentLink::open(connector, RetryPolicy::default()).await?;
//! let ident = link.request(b"*IDN?", Duration::from_millis(1000)).await?;
//! ```

pub mod error;
pub mod framing;
mod link;
pub mod mock;
mod serial;
mod session;
mod tcp;

pub use error::TransportError;
pub use link::PersistentLink;
pub use serial::SerialConnector;
pub use session::SessionLink;
pub use tcp::TcpConnector;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Anything that moves bytes both ways: serial ports, sockets, test doubles
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

/// Owned, type erased stream
pub type DynStream = Box<dyn ByteStream>;

/// Opens (and reopens) the handle behind a device
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> std::io::Result<DynStream>;

    /// Human readable address used in logs and errors
    fn locator(&self) -> &str;
}
