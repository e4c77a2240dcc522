//! Turns configuration into a probed [`Registry`]

use std::sync::Arc;

use netzteil_core::{DeviceInfo, PowerSupply, Registry};
use tracing::info;

use crate::config::{DeviceConfig, Locator, Model};
use crate::drivers::{hmc804, rnd320, Hmc804, Rnd320, SimulatedSupply};
use crate::error::RegistryError;
use crate::transport::{SerialConnector, TcpConnector};

/// Build every configured device and probe it, in order.
///
/// The first failure aborts the whole build; a partially built registry is
/// never returned.
pub async fn build_registry(configs: &[DeviceConfig]) -> Result<Registry, RegistryError> {
    let mut devices = Vec::with_capacity(configs.len());
    for (index, config) in configs.iter().enumerate() {
        let device = build_device(config).await?;
        info!(
            id = index + 1,
            name = config.display_name(),
            model = %config.model,
            handle = %config.handle,
            "Device ready"
        );
        devices.push(device);
    }
    Ok(Registry::new(devices))
}

/// Construct and probe a single device
pub async fn build_device(config: &DeviceConfig) -> Result<Arc<dyn PowerSupply>, RegistryError> {
    let model: Model = config.model.parse()?;
    let locator = Locator::parse(&config.handle)?;
    let name = config.display_name().to_string();
    let info = DeviceInfo::new(name.clone(), model.as_str(), config.handle.clone());

    let mismatch = || RegistryError::HandleMismatch {
        model: model.to_string(),
        handle: config.handle.clone(),
    };

    let device: Arc<dyn PowerSupply> = match (model, locator) {
        (Model::Dummy, Locator::Simulated) => {
            Arc::new(SimulatedSupply::new(info, config.channels.unwrap_or(1)))
        }
        (Model::Rnd320, Locator::Serial { path, baud_rate }) => {
            let connector = Arc::new(SerialConnector::new(
                path,
                baud_rate.unwrap_or(rnd320::DEFAULT_BAUD_RATE),
            ));
            let device = Rnd320::open(info, connector)
                .await
                .map_err(|source| RegistryError::Open {
                    name: name.clone(),
                    source,
                })?;
            Arc::new(device)
        }
        (Model::Hmc804, Locator::Tcp { target }) => {
            let connector = Arc::new(TcpConnector::new(target));
            Arc::new(Hmc804::new(
                info,
                connector,
                config.channels.unwrap_or(hmc804::DEFAULT_CHANNELS),
            ))
        }
        _ => return Err(mismatch()),
    };

    device
        .probe()
        .await
        .map_err(|source| RegistryError::Probe { name, source })?;

    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builds_in_order() {
        let configs = vec![
            DeviceConfig::new("dummy", "").with_name("first"),
            DeviceConfig::new("dummy", "dummy://")
                .with_name("second")
                .with_channels(3),
        ];

        let registry = build_registry(&configs).await.unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).unwrap().info().name, "first");
        assert_eq!(registry.get(2).unwrap().get_channels().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_scheme_must_match_model() {
        let err = build_device(&DeviceConfig::new("rnd320", "tcp://10.0.0.5:5025"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::HandleMismatch { .. }));

        let err = build_device(&DeviceConfig::new("hmc804", "file:///dev/ttyACM0"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::HandleMismatch { .. }));
    }

    #[tokio::test]
    async fn test_unknown_model_aborts_everything() {
        let configs = vec![
            DeviceConfig::new("dummy", ""),
            DeviceConfig::new("ea8000", "tcp://10.0.0.5:5025"),
        ];

        let err = build_registry(&configs).await.unwrap_err();
        assert!(matches!(err, RegistryError::UnknownModel(m) if m == "ea8000"));
    }

    #[tokio::test]
    async fn test_unreachable_device_fails_probe() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = build_device(&DeviceConfig::new("hmc804", format!("tcp://{}", addr)))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::Probe { .. }));
    }

    #[tokio::test]
    async fn test_missing_serial_port_fails_open() {
        let err = build_device(&DeviceConfig::new(
            "rnd320",
            "file:///dev/netzteil-does-not-exist",
        ))
        .await
        .err()
        .unwrap();
        assert!(matches!(err, RegistryError::Open { .. }));
    }
}
