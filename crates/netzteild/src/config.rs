//! Locating and loading the daemon configuration

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use netzteil_devices::{DeviceConfig, GatewayConfig};

/// `<user config dir>/netzteil/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("netzteil");

    Ok(config_dir.join("config.toml"))
}

/// Load and validate a configuration file
pub fn load_from(path: &Path) -> Result<GatewayConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = GatewayConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    if config.devices.is_empty() {
        bail!("No devices configured in {}", path.display());
    }
    Ok(config)
}

/// Resolve the configuration to run with.
///
/// An explicit path must exist. Without one the default location is tried,
/// and if nothing is there a single simulated supply is served.
pub fn load(explicit: Option<&Path>) -> Result<GatewayConfig> {
    if let Some(path) = explicit {
        tracing::info!("Loading config from: {}", path.display());
        return load_from(path);
    }

    let path = default_config_path()?;
    if path.exists() {
        tracing::info!("Loading config from: {}", path.display());
        load_from(&path)
    } else {
        tracing::warn!(
            "No config file at {}, serving a simulated supply",
            path.display()
        );
        Ok(GatewayConfig {
            devices: vec![DeviceConfig::new("dummy", "dummy://")],
            ..GatewayConfig::default()
        })
    }
}
