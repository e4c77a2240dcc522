//! Rohde & Schwarz HMC804x multi channel supplies over TCP (SCPI)
//!
//! The instrument accepts one TCP client at a time, so every operation opens
//! its own session. Channel scoped commands need `INST OUT{n}` first; both go
//! out in the same session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netzteil_core::{check_channel, DeviceError, DeviceInfo, DeviceResult, PowerSupply};
use parking_lot::RwLock;
use tracing::debug;

use super::{check_setpoint, parse_bool, parse_float};
use crate::transport::{Connector, SessionLink};

/// HMC8043; the 8041 and 8042 are configured with `channels = 1` / `2`
pub const DEFAULT_CHANNELS: u32 = 3;

/// Upper bound for a line reply
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Hmc804 {
    info: DeviceInfo,
    link: SessionLink,
    channels: u32,
    ident: RwLock<Option<String>>,
}

impl Hmc804 {
    pub fn new(info: DeviceInfo, connector: Arc<dyn Connector>, channels: u32) -> Self {
        Self {
            info,
            link: SessionLink::new(connector, REPLY_TIMEOUT),
            channels,
            ident: RwLock::new(None),
        }
    }

    fn select(channel: u32) -> String {
        format!("INST OUT{}", channel)
    }

    async fn query(&self, setup: &[String], query: &str) -> DeviceResult<String> {
        let reply = self.link.query(setup, query.as_bytes()).await?;
        debug!(device = %self.info.name, query, %reply, "Query");
        Ok(reply)
    }

    async fn channel_query(&self, channel: u32, query: &str) -> DeviceResult<String> {
        check_channel(channel, self.channels)?;
        self.query(&[Self::select(channel)], query).await
    }

    async fn channel_command(&self, channel: u32, command: String) -> DeviceResult<()> {
        check_channel(channel, self.channels)?;
        debug!(device = %self.info.name, channel, %command, "Command");
        self.link
            .send_batch(&[Self::select(channel), command])
            .await?;
        Ok(())
    }

    async fn read_ident(&self) -> DeviceResult<String> {
        let ident = self.query(&[], "*IDN?").await?;
        if ident.is_empty() {
            return Err(DeviceError::Protocol(
                "empty identification reply".to_string(),
            ));
        }
        *self.ident.write() = Some(ident.clone());
        Ok(ident)
    }

    fn on_off(enabled: bool) -> &'static str {
        if enabled {
            "ON"
        } else {
            "OFF"
        }
    }
}

#[async_trait]
impl PowerSupply for Hmc804 {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn probe(&self) -> DeviceResult<()> {
        let ident = self.read_ident().await?;
        debug!(device = %self.info.name, %ident, "Probed");
        Ok(())
    }

    /// Cached from the probe; the instrument is only asked again if that failed
    async fn get_ident(&self) -> DeviceResult<String> {
        let cached = self.ident.read().clone();
        match cached {
            Some(ident) => Ok(ident),
            None => self.read_ident().await,
        }
    }

    async fn get_master(&self) -> DeviceResult<bool> {
        parse_bool(&self.query(&[], "OUTP:MAST:STAT?").await?)
    }

    async fn set_master(&self, enabled: bool) -> DeviceResult<()> {
        let command = format!("OUTP:MAST {}", Self::on_off(enabled));
        self.link.send_batch(&[command]).await?;
        Ok(())
    }

    async fn get_channels(&self) -> DeviceResult<u32> {
        Ok(self.channels)
    }

    async fn get_voltage(&self, channel: u32) -> DeviceResult<f64> {
        parse_float(self.channel_query(channel, "VOLT?").await?.as_bytes())
    }

    async fn set_voltage(&self, channel: u32, volts: f64) -> DeviceResult<()> {
        check_setpoint("voltage", volts)?;
        self.channel_command(channel, format!("VOLT {:.3}", volts))
            .await
    }

    async fn get_current(&self, channel: u32) -> DeviceResult<f64> {
        parse_float(self.channel_query(channel, "CURR?").await?.as_bytes())
    }

    async fn set_current(&self, channel: u32, amps: f64) -> DeviceResult<()> {
        check_setpoint("current", amps)?;
        self.channel_command(channel, format!("CURR {:.3}", amps))
            .await
    }

    async fn get_out(&self, channel: u32) -> DeviceResult<bool> {
        parse_bool(&self.channel_query(channel, "OUTP:STAT?").await?)
    }

    async fn set_out(&self, channel: u32, enabled: bool) -> DeviceResult<()> {
        self.channel_command(channel, format!("OUTP:CHAN {}", Self::on_off(enabled)))
            .await
    }
}
