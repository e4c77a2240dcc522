//! Ordered, read-only collection of probed devices
//!
//! Device ids are 1-based on the wire and map onto the 0-based position in
//! the registry. The registry never changes after startup.

use std::sync::Arc;

use crate::device::PowerSupply;
use crate::error::{DeviceError, DeviceResult};

/// Address of a channel after resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    /// Channel 0, the device-wide master output
    Master,
    /// A physical channel, 1-based
    Channel(u32),
}

#[derive(Clone, Default)]
pub struct Registry {
    devices: Arc<Vec<Arc<dyn PowerSupply>>>,
}

impl Registry {
    pub fn new(devices: Vec<Arc<dyn PowerSupply>>) -> Self {
        Self {
            devices: Arc::new(devices),
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in registry order, paired with their wire id
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<dyn PowerSupply>)> {
        self.devices
            .iter()
            .enumerate()
            .map(|(index, device)| (index as u32 + 1, device))
    }

    /// Look up a device by its 1-based id
    pub fn get(&self, id: u32) -> DeviceResult<&Arc<dyn PowerSupply>> {
        let index = id
            .checked_sub(1)
            .ok_or_else(|| DeviceError::DeviceNotFound(id.to_string()))?;
        self.devices
            .get(index as usize)
            .ok_or_else(|| DeviceError::DeviceNotFound(id.to_string()))
    }

    /// Look up a device and validate a channel against its reported count.
    ///
    /// Channel 0 resolves to [`ChannelTarget::Master`].
    pub async fn resolve(
        &self,
        id: u32,
        channel: u32,
    ) -> DeviceResult<(&Arc<dyn PowerSupply>, ChannelTarget)> {
        let device = self.get(id)?;
        if channel == 0 {
            return Ok((device, ChannelTarget::Master));
        }

        let channels = device.get_channels().await?;
        if channel > channels {
            return Err(DeviceError::ChannelNotFound(format!(
                "device {} has {} channel(s), requested {}",
                id, channels, channel
            )));
        }
        Ok((device, ChannelTarget::Channel(channel)))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.devices.iter().map(|d| d.info()))
            .finish()
    }
}
