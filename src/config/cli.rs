use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "drive-amplifier")]
#[command(about = "Drive amplifier device facade over a PLC device server")]
pub struct CliConfig {
    /// Path to the TOML device configuration
    #[arg(short, long, default_value = "amplifier.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run the alarm monitor until interrupted
    Serve,
    /// Evaluate the alarms once and print state and status
    Status,
    /// Read one attribute
    Read { attribute: String },
    /// Write a read-write attribute
    Write { attribute: String, value: String },
    /// Execute a device command (EnableTtl, DisableTtl)
    Exec { command: String },
    /// List the attribute and command table
    Attributes,
}
