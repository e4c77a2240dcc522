//! Set command - write one resource

use anyhow::{bail, Context, Result};
use netzteil_client::NetzteilClient;

use super::{Endpoint, Setpoint};
use crate::output::{on_off, OutputContext};

/// Write a value to an endpoint of a device or channel
pub async fn set(
    client: &NetzteilClient,
    endpoint: Endpoint,
    value: &str,
    device: u32,
    channel: u32,
    ctx: &OutputContext,
) -> Result<()> {
    let setpoint = Setpoint::parse(endpoint, value)?;

    let result = match (endpoint, setpoint) {
        (Endpoint::Master, Setpoint::Switch(on)) => client.set_master(device, on).await,
        (Endpoint::Beep, Setpoint::Switch(on)) => client.set_beep(device, on).await,
        (Endpoint::Out, Setpoint::Switch(on)) => client.set_out(device, channel, on).await,
        (Endpoint::Ocp, Setpoint::Switch(on)) => client.set_ocp(device, channel, on).await,
        (Endpoint::Ovp, Setpoint::Switch(on)) => client.set_ovp(device, channel, on).await,
        (Endpoint::Voltage, Setpoint::Level(volts)) => {
            client.set_voltage(device, channel, volts).await
        }
        (Endpoint::Current, Setpoint::Level(amps)) => {
            client.set_current(device, channel, amps).await
        }
        _ => bail!("{} cannot be set", endpoint.name()),
    };
    result.with_context(|| format!("Failed to set {}", endpoint.name()))?;

    let shown = match setpoint {
        Setpoint::Switch(on) => on_off(on),
        Setpoint::Level(level) => level.to_string(),
    };
    ctx.success(&format!(
        "Device {} {} set to {}",
        device,
        target(endpoint, channel),
        shown
    ));
    Ok(())
}

fn target(endpoint: Endpoint, channel: u32) -> String {
    match endpoint {
        Endpoint::Master | Endpoint::Beep => endpoint.name().to_string(),
        _ => format!("channel {} {}", channel, endpoint.name()),
    }
}
