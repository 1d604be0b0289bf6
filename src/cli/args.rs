//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live-reload client for a change server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: relive.toml)
    #[arg(short = 'C', long, default_value = "relive.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print connection and dispatch details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands (none: autostart per config)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Connect to the change server and keep the page in sync
    #[command(visible_alias = "w")]
    Watch {
        /// HTML page seeding the live document
        #[arg(value_hint = clap::ValueHint::FilePath)]
        page: Option<PathBuf>,

        /// Socket url of the change server
        #[arg(short, long)]
        url: Option<String>,

        /// Reconnect interval in milliseconds
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

impl Cli {
    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Some(Commands::Watch { .. }))
    }
}
