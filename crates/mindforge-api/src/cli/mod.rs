//! CLI command definitions for the `mindforge` binary.

pub mod provider;
pub mod user;

use clap::{Parser, Subcommand, ValueEnum};
use mindforge_observe::tracing_setup::LogFormat;

/// MindForge chat backend.
#[derive(Parser)]
#[command(name = "mindforge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Detailed output (-v for debug, -vv for trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line encoding.
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value = "json", global = true)]
    pub log_format: LogFormatArg,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Bind address (defaults to `[server] host` from config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Port (defaults to `[server] port` or `PORT`).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// List registered providers and optionally resolve a model string.
    Providers {
        /// Show which provider this model string routes to.
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user and print a fresh API key (shown once).
    Create {
        /// Display name.
        name: String,
    },
}
