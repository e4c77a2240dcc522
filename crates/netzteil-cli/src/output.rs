//! Output formatting for the netzteil CLI (table, json)

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable (default)
    #[default]
    Table,
    /// JSON, one document per result or stream frame
    Json,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
        }
    }

    /// Print a single value: JSON as is, or the human rendering
    pub fn print_value(&self, value: &serde_json::Value, human: &str) {
        match self.format {
            OutputFormat::Table => println!("{}", human),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            ),
        }
    }
}

/// Colored on/off rendering of a boolean state
pub fn on_off(enabled: bool) -> String {
    if enabled {
        "on".green().to_string()
    } else {
        "off".red().to_string()
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Device display for the devices command
#[derive(Debug, Tabled, Serialize)]
pub struct DeviceRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Ident")]
    pub ident: String,
}

impl DeviceRow {
    pub fn new(id: u32, ident: &str) -> Self {
        let ident = if ident.is_empty() {
            "NO DESCRIPTION".to_string()
        } else {
            ident.to_string()
        };
        Self {
            id: format!("{:02}", id),
            ident,
        }
    }
}
