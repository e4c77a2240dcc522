//! netzteil - Command-line tool for netzteil power supply gateways
//!
//! Reads and writes single resources, lists devices and watches live
//! measurements.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netzteil_client::NetzteilClient;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{Endpoint, Quantity};
use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "netzteil")]
#[command(author, version, about = "Bench power supply gateway CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Gateway URL [default: http://localhost:8000]
    #[arg(short, long, env = "NETZTEIL_SERVER")]
    server: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "NETZTEIL_CLI_CONFIG")]
    config: Option<PathBuf>,

    /// Output format [default: table]
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all devices
    Devices,

    /// Read a value
    Get {
        #[arg(value_enum)]
        endpoint: Endpoint,

        /// Device id (1-based)
        #[arg(short, long, default_value_t = 1)]
        device: u32,

        /// Channel (1-based, 0 = master output for `out`)
        #[arg(short, long, default_value_t = 1)]
        channel: u32,
    },

    /// Write a value
    Set {
        #[arg(value_enum)]
        endpoint: Endpoint,

        /// Number for voltage/current, on/off for switches
        value: String,

        /// Device id (1-based)
        #[arg(short, long, default_value_t = 1)]
        device: u32,

        /// Channel (1-based, 0 = master output for `out`)
        #[arg(short, long, default_value_t = 1)]
        channel: u32,
    },

    /// Stream live measurements (WebSocket)
    Watch {
        #[arg(value_enum, default_value_t = Quantity::Both)]
        quantity: Quantity,

        /// Device id (1-based)
        #[arg(short, long, default_value_t = 1)]
        device: u32,

        /// Channel (1-based)
        #[arg(short, long, default_value_t = 1)]
        channel: u32,

        /// Polling interval in milliseconds (server default: 1000)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(cli.server.as_deref(), cli.output, cli.no_color);

    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);
    let client = create_client(&merged.server)?;

    let result = match cli.command {
        Commands::Devices => commands::devices(&client, &ctx).await,
        Commands::Get {
            endpoint,
            device,
            channel,
        } => commands::get(&client, endpoint, device, channel, &ctx).await,
        Commands::Set {
            endpoint,
            value,
            device,
            channel,
        } => commands::set(&client, endpoint, &value, device, channel, &ctx).await,
        Commands::Watch {
            quantity,
            device,
            channel,
            interval,
        } => commands::watch(&client, quantity, device, channel, interval, &ctx).await,
    };

    if let Err(e) = result {
        ctx.error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

/// Create a gateway client for the given server URL
fn create_client(server: &str) -> Result<NetzteilClient> {
    NetzteilClient::new(server).context("Failed to create netzteil client")
}
