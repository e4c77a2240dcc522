//! USB serial handles

use std::io;

use async_trait::async_trait;
use tokio_serial::SerialPortBuilderExt;
use tracing::debug;

use super::{Connector, DynStream};

/// Opens a serial device node with 8N1 framing and no flow control
#[derive(Debug, Clone)]
pub struct SerialConnector {
    path: String,
    baud_rate: u32,
    locator: String,
}

impl SerialConnector {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        let path = path.into();
        Self {
            locator: format!("serial://{}@{}", path, baud_rate),
            path,
            baud_rate,
        }
    }
}

#[async_trait]
impl Connector for SerialConnector {
    async fn connect(&self) -> io::Result<DynStream> {
        debug!(path = %self.path, baud = self.baud_rate, "Opening serial port");
        let port = tokio_serial::new(&self.path, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(io::Error::from)?;
        Ok(Box::new(port))
    }

    fn locator(&self) -> &str {
        &self.locator
    }
}
