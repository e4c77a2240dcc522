//! Get command - read one resource

use anyhow::{bail, Context, Result};
use netzteil_client::NetzteilClient;
use serde_json::{json, Value};

use super::Endpoint;
use crate::output::{on_off, OutputContext};

/// Read an endpoint of a device or channel
pub async fn get(
    client: &NetzteilClient,
    endpoint: Endpoint,
    device: u32,
    channel: u32,
    ctx: &OutputContext,
) -> Result<()> {
    let context = || format!("Failed to read {}", endpoint.name());

    let (value, human) = match endpoint {
        Endpoint::Ident => {
            let ident = client.ident(device).await.with_context(context)?;
            (json!(ident), ident)
        }
        Endpoint::Status => {
            let status = client.status(device).await.with_context(context)?;
            let human = serde_json::to_string_pretty(&status)?;
            (status, human)
        }
        Endpoint::Channels => {
            let channels = client.channels(device).await.with_context(context)?;
            (json!(channels), channels.to_string())
        }
        Endpoint::Master => switch(client.master(device).await.with_context(context)?),
        Endpoint::Out => switch(client.out(device, channel).await.with_context(context)?),
        Endpoint::Ocp => switch(client.ocp(device, channel).await.with_context(context)?),
        Endpoint::Ovp => switch(client.ovp(device, channel).await.with_context(context)?),
        Endpoint::Voltage => {
            let volts = client.voltage(device, channel).await.with_context(context)?;
            (json!(volts), format!("{:.3} V", volts))
        }
        Endpoint::Current => {
            let amps = client.current(device, channel).await.with_context(context)?;
            (json!(amps), format!("{:.3} A", amps))
        }
        Endpoint::Beep => bail!("beep can only be set"),
    };

    if ctx.quiet {
        println!("{}", plain(&value));
    } else {
        ctx.print_value(&value, &human);
    }
    Ok(())
}

fn switch(enabled: bool) -> (Value, String) {
    (json!(enabled), on_off(enabled))
}

/// Scripting friendly rendering: strings without quotes
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
