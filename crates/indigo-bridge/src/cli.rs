//! Clap derive structures for the `indigo-bridge` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use indigo_core::{CharValue, Characteristic};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// indigo-bridge -- expose Indigo devices as accessories
#[derive(Debug, Parser)]
#[command(
    name = "indigo-bridge",
    version,
    about = "Bridge Indigo home-automation devices to HomeKit-style accessories",
    long_about = "Discovers devices through the Indigo REST API, classifies them into\n\
        accessories, and keeps characteristic values in sync in both directions.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "INDIGO_BRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Indigo host (overrides the config file)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Indigo port (overrides the config file)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover accessories and keep them in sync until interrupted
    Run,

    /// Discover and list the accessories that would be exposed
    #[command(alias = "ls")]
    List,

    /// Read a characteristic from an accessory
    Get(GetArgs),

    /// Write a characteristic on an accessory
    Set(SetArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Indigo device or action id
    pub id: String,

    /// Characteristic name (e.g. on, brightness, target-door-state)
    pub characteristic: Characteristic,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Indigo device or action id
    pub id: String,

    /// Characteristic name (e.g. on, brightness, target-door-state)
    pub characteristic: Characteristic,

    /// New value: true/false/on/off or a number
    pub value: CharValue,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (password redacted)
    Show,

    /// Print the config file location
    Path,

    /// Write a starter config file
    Init {
        /// Indigo host to put in the starter file
        #[arg(long, default_value = "localhost")]
        server: String,
    },

    /// Store the Indigo password in the system keyring
    SetPassword {
        /// Password to store
        #[arg(long, env = "INDIGO_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }
}
