//! RND 320 (KA3005P family) single channel supply on USB serial
//!
//! The protocol has no terminators at all: commands are bare ASCII and a reply
//! ends when the device stops sending. Every exchange therefore goes through
//! the silence framed primitive, wrapped in the retry/reopen policy because
//! the USB adapter drops its handle whenever the supply is power cycled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netzteil_core::{
    check_channel, ChannelMode, DeviceError, DeviceInfo, DeviceResult, PowerSupply,
};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, trace};

use super::{check_setpoint, parse_float};
use crate::retry::RetryPolicy;
use crate::transport::{Connector, PersistentLink, TransportError};

pub const DEFAULT_BAUD_RATE: u32 = 9600;

const CHANNELS: u32 = 1;

/// The identification reply trickles in slowly
const IDENT_IDLE: Duration = Duration::from_millis(1000);
const QUERY_IDLE: Duration = Duration::from_millis(100);

const STATUS_CV: u8 = 0x01;
const STATUS_OUTPUT: u8 = 0x40;

/// Decoded `STATUS?` byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rnd320Status {
    pub mode: ChannelMode,
    pub output: bool,
}

impl Rnd320Status {
    fn decode(reply: &[u8]) -> DeviceResult<Self> {
        let [byte] = reply else {
            return Err(DeviceError::Protocol(format!(
                "status reply must be one byte, got {}",
                hex::encode(reply)
            )));
        };

        Ok(Self {
            mode: if byte & STATUS_CV != 0 {
                ChannelMode::Cv
            } else {
                ChannelMode::Cc
            },
            output: byte & STATUS_OUTPUT != 0,
        })
    }
}

pub struct Rnd320 {
    info: DeviceInfo,
    link: PersistentLink,
    ident: RwLock<Option<String>>,
}

impl Rnd320 {
    /// Open the serial handle with the default 3 x 500 ms retry policy
    pub async fn open(info: DeviceInfo, connector: Arc<dyn Connector>) -> Result<Self, TransportError> {
        let link = PersistentLink::open(connector, RetryPolicy::default()).await?;
        Ok(Self::with_link(info, link))
    }

    pub fn with_link(info: DeviceInfo, link: PersistentLink) -> Self {
        Self {
            info,
            link,
            ident: RwLock::new(None),
        }
    }

    async fn query(&self, cmd: &str, idle: Duration) -> DeviceResult<Vec<u8>> {
        let reply = self.link.request(cmd.as_bytes(), idle).await?;
        trace!(device = %self.info.name, cmd, reply = %hex::encode(&reply), "Query");
        Ok(reply)
    }

    async fn command(&self, cmd: &str) -> DeviceResult<()> {
        trace!(device = %self.info.name, cmd, "Command");
        self.link.send(cmd.as_bytes()).await?;
        Ok(())
    }

    async fn read_ident(&self) -> DeviceResult<String> {
        let reply = self.query("*IDN?", IDENT_IDLE).await?;
        let ident = String::from_utf8_lossy(&reply)
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_string();
        if ident.is_empty() {
            return Err(DeviceError::Protocol(
                "no reply to identification request".to_string(),
            ));
        }
        *self.ident.write() = Some(ident.clone());
        Ok(ident)
    }

    pub async fn read_status(&self) -> DeviceResult<Rnd320Status> {
        let reply = self.query("STATUS?", QUERY_IDLE).await?;
        Rnd320Status::decode(&reply)
    }
}

#[async_trait]
impl PowerSupply for Rnd320 {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn probe(&self) -> DeviceResult<()> {
        let ident = self.read_ident().await?;
        debug!(device = %self.info.name, %ident, "Probed");
        Ok(())
    }

    async fn get_ident(&self) -> DeviceResult<String> {
        let cached = self.ident.read().clone();
        match cached {
            Some(ident) => Ok(ident),
            None => self.read_ident().await,
        }
    }

    async fn status(&self) -> DeviceResult<serde_json::Value> {
        let status = self.read_status().await?;
        serde_json::to_value(status).map_err(|e| DeviceError::Internal(e.to_string()))
    }

    async fn get_master(&self) -> DeviceResult<bool> {
        Ok(self.read_status().await?.output)
    }

    async fn set_master(&self, enabled: bool) -> DeviceResult<()> {
        self.command(if enabled { "OUT1" } else { "OUT0" }).await
    }

    async fn get_channels(&self) -> DeviceResult<u32> {
        Ok(CHANNELS)
    }

    async fn get_voltage(&self, channel: u32) -> DeviceResult<f64> {
        check_channel(channel, CHANNELS)?;
        let reply = self.query(&format!("VOUT{}?", channel), QUERY_IDLE).await?;
        parse_float(&reply)
    }

    async fn set_voltage(&self, channel: u32, volts: f64) -> DeviceResult<()> {
        check_channel(channel, CHANNELS)?;
        check_setpoint("voltage", volts)?;
        self.command(&format!("VSET{}:{:.2}", channel, volts)).await
    }

    async fn get_current(&self, channel: u32) -> DeviceResult<f64> {
        check_channel(channel, CHANNELS)?;
        let reply = self.query(&format!("IOUT{}?", channel), QUERY_IDLE).await?;
        parse_float(&reply)
    }

    async fn set_current(&self, channel: u32, amps: f64) -> DeviceResult<()> {
        check_channel(channel, CHANNELS)?;
        check_setpoint("current", amps)?;
        self.command(&format!("ISET{}:{:.2}", channel, amps)).await
    }

    /// The only channel's output is the master output
    async fn get_out(&self, channel: u32) -> DeviceResult<bool> {
        check_channel(channel, CHANNELS)?;
        self.get_master().await
    }

    async fn set_out(&self, channel: u32, enabled: bool) -> DeviceResult<()> {
        check_channel(channel, CHANNELS)?;
        self.set_master(enabled).await
    }
}
