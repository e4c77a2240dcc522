//! Application state for the gateway API

use std::sync::Arc;
use std::time::Duration;

use netzteil_core::{ChannelTarget, DeviceError, PowerSupply, Registry};

use crate::error::ApiError;

/// Default upper bound for one HTTP request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    registry: Registry,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create AppState from a single device (reduced API deployments, tests)
    pub fn single(device: Arc<dyn PowerSupply>) -> Self {
        Self::new(Registry::new(vec![device]))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Get a device by its 1-based id
    pub fn device(&self, id: u32) -> Result<&Arc<dyn PowerSupply>, ApiError> {
        Ok(self.registry.get(id)?)
    }

    /// Resolve a physical channel; channel 0 is rejected
    pub async fn channel(
        &self,
        id: u32,
        channel: u32,
    ) -> Result<(&Arc<dyn PowerSupply>, u32), ApiError> {
        match self.registry.resolve(id, channel).await? {
            (device, ChannelTarget::Channel(channel)) => Ok((device, channel)),
            (_, ChannelTarget::Master) => Err(DeviceError::ChannelNotFound(
                "channel 0 is the master output and only valid for 'out'".to_string(),
            )
            .into()),
        }
    }

    /// Resolve a channel where 0 stands for the master output
    pub async fn output(
        &self,
        id: u32,
        channel: u32,
    ) -> Result<(&Arc<dyn PowerSupply>, ChannelTarget), ApiError> {
        Ok(self.registry.resolve(id, channel).await?)
    }
}
