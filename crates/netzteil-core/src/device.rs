//! PowerSupply trait - the capability set every driver implements
//!
//! Channels are 1-based as on the front panel and in the vendor command sets.
//! Channel 0 (the master alias) is resolved by the gateway and never reaches a
//! driver.

use async_trait::async_trait;

use crate::error::{DeviceError, DeviceResult};
use crate::models::DeviceInfo;

/// A bench power supply reachable through some transport.
///
/// Capabilities a model lacks keep the default implementation, which reports
/// [`DeviceError::NotSupported`] instead of pretending to succeed.
#[async_trait]
pub trait PowerSupply: Send + Sync {
    /// Static description from configuration
    fn info(&self) -> &DeviceInfo;

    // =========================================================================
    // Identity
    // =========================================================================

    /// Verify reachability and remember the identity string
    async fn probe(&self) -> DeviceResult<()>;

    /// Identity string (vendor, model, serial as reported by the device)
    async fn get_ident(&self) -> DeviceResult<String>;

    /// Model specific status document
    async fn status(&self) -> DeviceResult<serde_json::Value> {
        Err(DeviceError::not_supported("status"))
    }

    /// Enable or disable the key beep
    async fn set_beep(&self, enabled: bool) -> DeviceResult<()> {
        let _ = enabled;
        Err(DeviceError::not_supported("set_beep"))
    }

    // =========================================================================
    // Master output
    // =========================================================================

    async fn get_master(&self) -> DeviceResult<bool> {
        Err(DeviceError::not_supported("get_master"))
    }

    async fn set_master(&self, enabled: bool) -> DeviceResult<()> {
        let _ = enabled;
        Err(DeviceError::not_supported("set_master"))
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Number of physical output channels
    async fn get_channels(&self) -> DeviceResult<u32>;

    async fn get_voltage(&self, channel: u32) -> DeviceResult<f64> {
        let _ = channel;
        Err(DeviceError::not_supported("get_voltage"))
    }

    async fn set_voltage(&self, channel: u32, volts: f64) -> DeviceResult<()> {
        let _ = (channel, volts);
        Err(DeviceError::not_supported("set_voltage"))
    }

    async fn get_current(&self, channel: u32) -> DeviceResult<f64> {
        let _ = channel;
        Err(DeviceError::not_supported("get_current"))
    }

    async fn set_current(&self, channel: u32, amps: f64) -> DeviceResult<()> {
        let _ = (channel, amps);
        Err(DeviceError::not_supported("set_current"))
    }

    async fn get_out(&self, channel: u32) -> DeviceResult<bool> {
        let _ = channel;
        Err(DeviceError::not_supported("get_out"))
    }

    async fn set_out(&self, channel: u32, enabled: bool) -> DeviceResult<()> {
        let _ = (channel, enabled);
        Err(DeviceError::not_supported("set_out"))
    }

    // =========================================================================
    // Protection
    // =========================================================================

    /// Over-current protection state
    async fn get_ocp(&self, channel: u32) -> DeviceResult<bool> {
        let _ = channel;
        Err(DeviceError::not_supported("get_ocp"))
    }

    async fn set_ocp(&self, channel: u32, enabled: bool) -> DeviceResult<()> {
        let _ = (channel, enabled);
        Err(DeviceError::not_supported("set_ocp"))
    }

    /// Over-voltage protection state
    async fn get_ovp(&self, channel: u32) -> DeviceResult<bool> {
        let _ = channel;
        Err(DeviceError::not_supported("get_ovp"))
    }

    async fn set_ovp(&self, channel: u32, enabled: bool) -> DeviceResult<()> {
        let _ = (channel, enabled);
        Err(DeviceError::not_supported("set_ovp"))
    }
}

/// Reject channels outside `1..=channels`.
///
/// Drivers call this before building a command so a bad channel never reaches
/// the wire.
pub fn check_channel(channel: u32, channels: u32) -> DeviceResult<()> {
    if channel == 0 || channel > channels {
        return Err(DeviceError::ChannelNotFound(format!(
            "channel {} (device has {})",
            channel, channels
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare {
        info: DeviceInfo,
    }

    #[async_trait]
    impl PowerSupply for Bare {
        fn info(&self) -> &DeviceInfo {
            &self.info
        }

        async fn probe(&self) -> DeviceResult<()> {
            Ok(())
        }

        async fn get_ident(&self) -> DeviceResult<String> {
            Ok("bare".to_string())
        }

        async fn get_channels(&self) -> DeviceResult<u32> {
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_defaults_report_not_supported() {
        let device = Bare {
            info: DeviceInfo::new("bare", "bare", ""),
        };

        assert!(matches!(
            device.set_ocp(1, true).await,
            Err(DeviceError::NotSupported(op)) if op == "set_ocp"
        ));
        assert!(matches!(
            device.status().await,
            Err(DeviceError::NotSupported(_))
        ));
        assert!(matches!(
            device.get_voltage(1).await,
            Err(DeviceError::NotSupported(_))
        ));
    }

    #[test]
    fn test_check_channel_bounds() {
        assert!(check_channel(1, 3).is_ok());
        assert!(check_channel(3, 3).is_ok());
        assert!(matches!(
            check_channel(0, 3),
            Err(DeviceError::ChannelNotFound(_))
        ));
        assert!(matches!(
            check_channel(4, 3),
            Err(DeviceError::ChannelNotFound(_))
        ));
    }
}
