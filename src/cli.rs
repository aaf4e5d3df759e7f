//! Command-line interface

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pausescan", version, about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// Register the hotkey and wait for presses (default)
    Run {
        /// Use fixture gateways and the OCR cache instead of the live OS
        #[arg(long)]
        dev: bool,
    },
    /// Store the Google Cloud Vision API key in the settings file
    SetApiKey {
        #[arg(env = "PAUSESCAN_SET_API_KEY", hide_env_values = true)]
        key: String,
    },
    /// Remove the stored API key
    ClearApiKey,
    /// Print the settings file with secrets masked
    ShowSettings,
}

impl Cli {
    /// The subcommand to run; no subcommand means `run`
    pub(crate) fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run { dev: false })
    }
}
