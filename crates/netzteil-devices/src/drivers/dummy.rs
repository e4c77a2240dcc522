//! In-memory simulated power supply
//!
//! Keeps every setpoint it is given and reports it back, which makes it the
//! reference device for gateway tests and for trying out clients without a
//! bench.

use async_trait::async_trait;
use netzteil_core::{check_channel, DeviceError, DeviceInfo, DeviceResult, PowerSupply};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use super::check_setpoint;

const IDENT: &str = "netzteil,dummy,0,1.0";

#[derive(Debug, Clone, Serialize)]
struct ChannelState {
    voltage: f64,
    current: f64,
    out: bool,
    ocp: bool,
    ovp: bool,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            voltage: 15.0,
            current: 12.0,
            out: true,
            ocp: true,
            ovp: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct SimulatedState {
    master: bool,
    beep: bool,
    channels: Vec<ChannelState>,
}

pub struct SimulatedSupply {
    info: DeviceInfo,
    state: Mutex<SimulatedState>,
}

impl SimulatedSupply {
    pub fn new(info: DeviceInfo, channels: u32) -> Self {
        let channels = channels.max(1);
        Self {
            info,
            state: Mutex::new(SimulatedState {
                master: true,
                beep: true,
                channels: vec![ChannelState::default(); channels as usize],
            }),
        }
    }

    fn channel_count(&self) -> u32 {
        self.state.lock().channels.len() as u32
    }

    fn with_channel<T>(
        &self,
        channel: u32,
        f: impl FnOnce(&mut ChannelState) -> T,
    ) -> DeviceResult<T> {
        check_channel(channel, self.channel_count())?;
        let mut state = self.state.lock();
        Ok(f(&mut state.channels[channel as usize - 1]))
    }
}

#[async_trait]
impl PowerSupply for SimulatedSupply {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn probe(&self) -> DeviceResult<()> {
        debug!(device = %self.info.name, "Simulated probe");
        Ok(())
    }

    async fn get_ident(&self) -> DeviceResult<String> {
        Ok(IDENT.to_string())
    }

    async fn status(&self) -> DeviceResult<serde_json::Value> {
        let state = self.state.lock().clone();
        serde_json::to_value(state).map_err(|e| DeviceError::Internal(e.to_string()))
    }

    async fn set_beep(&self, enabled: bool) -> DeviceResult<()> {
        self.state.lock().beep = enabled;
        Ok(())
    }

    async fn get_master(&self) -> DeviceResult<bool> {
        Ok(self.state.lock().master)
    }

    async fn set_master(&self, enabled: bool) -> DeviceResult<()> {
        self.state.lock().master = enabled;
        Ok(())
    }

    async fn get_channels(&self) -> DeviceResult<u32> {
        Ok(self.channel_count())
    }

    async fn get_voltage(&self, channel: u32) -> DeviceResult<f64> {
        self.with_channel(channel, |ch| ch.voltage)
    }

    async fn set_voltage(&self, channel: u32, volts: f64) -> DeviceResult<()> {
        check_setpoint("voltage", volts)?;
        self.with_channel(channel, |ch| ch.voltage = volts)
    }

    async fn get_current(&self, channel: u32) -> DeviceResult<f64> {
        self.with_channel(channel, |ch| ch.current)
    }

    async fn set_current(&self, channel: u32, amps: f64) -> DeviceResult<()> {
        check_setpoint("current", amps)?;
        self.with_channel(channel, |ch| ch.current = amps)
    }

    async fn get_out(&self, channel: u32) -> DeviceResult<bool> {
        self.with_channel(channel, |ch| ch.out)
    }

    async fn set_out(&self, channel: u32, enabled: bool) -> DeviceResult<()> {
        self.with_channel(channel, |ch| ch.out = enabled)
    }

    async fn get_ocp(&self, channel: u32) -> DeviceResult<bool> {
        self.with_channel(channel, |ch| ch.ocp)
    }

    async fn set_ocp(&self, channel: u32, enabled: bool) -> DeviceResult<()> {
        self.with_channel(channel, |ch| ch.ocp = enabled)
    }

    async fn get_ovp(&self, channel: u32) -> DeviceResult<bool> {
        self.with_channel(channel, |ch| ch.ovp)
    }

    async fn set_ovp(&self, channel: u32, enabled: bool) -> DeviceResult<()> {
        self.with_channel(channel, |ch| ch.ovp = enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supply(channels: u32) -> SimulatedSupply {
        SimulatedSupply::new(DeviceInfo::new("sim", "dummy", "dummy://"), channels)
    }

    #[tokio::test]
    async fn test_initial_values() {
        let psu = supply(1);
        assert_eq!(psu.get_channels().await.unwrap(), 1);
        assert_eq!(psu.get_voltage(1).await.unwrap(), 15.0);
        assert_eq!(psu.get_current(1).await.unwrap(), 12.0);
        assert!(psu.get_master().await.unwrap());
        assert!(psu.get_ocp(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_setpoints_are_kept_per_channel() {
        let psu = supply(3);
        psu.set_voltage(2, 5.0).await.unwrap();
        psu.set_out(3, false).await.unwrap();

        assert_eq!(psu.get_voltage(2).await.unwrap(), 5.0);
        assert_eq!(psu.get_voltage(1).await.unwrap(), 15.0);
        assert!(!psu.get_out(3).await.unwrap());
        assert!(psu.get_out(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let psu = supply(1);
        assert!(matches!(
            psu.get_voltage(2).await,
            Err(DeviceError::ChannelNotFound(_))
        ));
        assert!(matches!(
            psu.set_current(1, -0.5).await,
            Err(DeviceError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_status_reflects_state() {
        let psu = supply(2);
        psu.set_master(false).await.unwrap();
        psu.set_beep(false).await.unwrap();

        let status = psu.status().await.unwrap();
        assert_eq!(status["master"], false);
        assert_eq!(status["beep"], false);
        assert_eq!(status["channels"].as_array().unwrap().len(), 2);
    }
}
