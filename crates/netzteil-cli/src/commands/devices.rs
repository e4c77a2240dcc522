//! Devices command - list the gateway's supplies

use anyhow::Result;
use netzteil_client::NetzteilClient;

use crate::output::{DeviceRow, OutputContext};

/// List all devices with their wire ids
pub async fn devices(client: &NetzteilClient, ctx: &OutputContext) -> Result<()> {
    let idents = client.list_devices().await?;

    let rows: Vec<DeviceRow> = idents
        .iter()
        .zip(1u32..)
        .map(|(ident, id)| DeviceRow::new(id, ident))
        .collect();

    ctx.print(&rows);
    Ok(())
}
