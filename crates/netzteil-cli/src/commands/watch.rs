//! Watch command - live measurements over WebSocket

use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use netzteil_client::{Measurement, NetzteilClient, Readout, StreamFrame};

use crate::output::{OutputContext, OutputFormat};

/// What to sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Quantity {
    Voltage,
    Current,
    #[default]
    Both,
}

impl From<Quantity> for Readout {
    fn from(quantity: Quantity) -> Self {
        match quantity {
            Quantity::Voltage => Readout::Voltage,
            Quantity::Current => Readout::Current,
            Quantity::Both => Readout::Both,
        }
    }
}

/// Stream measurements until Ctrl+C or the server closes the stream
pub async fn watch(
    client: &NetzteilClient,
    quantity: Quantity,
    device: u32,
    channel: u32,
    interval_ms: Option<u64>,
    ctx: &OutputContext,
) -> Result<()> {
    let interval = interval_ms.map(Duration::from_millis);
    let mut stream = client
        .stream(device, channel, quantity.into(), interval)
        .await
        .context("Failed to open measurement stream")?;

    ctx.info(&format!(
        "Watching device {} channel {}, press Ctrl+C to stop",
        device, channel
    ));

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(frame)) => print_frame(&frame, ctx),
                Some(Err(e)) => {
                    ctx.error(&format!("Stream error: {}", e));
                    break;
                }
                None => {
                    ctx.info("Stream ended");
                    return Ok(());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                ctx.info("\nStopping...");
                break;
            }
        }
    }

    if let Err(e) = stream.close().await {
        tracing::debug!("Closing stream failed: {}", e);
    }
    Ok(())
}

fn print_frame(frame: &StreamFrame, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(frame) {
                println!("{}", json);
            }
        }
        OutputFormat::Table => match frame {
            StreamFrame::Measurement(m) => println!("{}", format_measurement(m)),
            StreamFrame::Error { error } => ctx.warn(&format!("device error: {}", error)),
        },
    }
}

fn format_measurement(m: &Measurement) -> String {
    let mut line = format!("[{}]", m.time.format("%H:%M:%S%.3f"));
    if let Some(volts) = m.voltage {
        line.push_str(&format!(" {:>8.3} V", volts));
    }
    if let Some(amps) = m.current {
        line.push_str(&format!(" {:>8.3} A", amps));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_line() {
        let frame: StreamFrame =
            serde_json::from_str(r#"{"voltage":5.0,"current":0.25,"time":"2024-05-01T12:00:01.5Z"}"#)
                .unwrap();
        let StreamFrame::Measurement(m) = frame else {
            panic!("expected a measurement");
        };
        assert_eq!(format_measurement(&m), "[12:00:01.500]    5.000 V    0.250 A");
    }
}
