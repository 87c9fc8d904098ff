//! CLI command definitions.

pub mod announcements;
pub mod events;
pub mod guests;

use clap::{Parser, Subcommand, ValueEnum};
use gatherly::DataLayer;

use crate::output::Rendered;

/// Command-line front end for the gatherly data layer.
#[derive(Debug, Parser)]
#[command(name = "gatherly")]
#[command(version, about = "Query and update gatherly events, guests and announcements", long_about = None)]
pub struct Cli {
    /// Backend API root. Overrides the configured URL.
    #[arg(long, env = "GATHERLY_API_URL")]
    pub base_url: Option<String>,

    /// Bearer token for authenticated endpoints.
    #[arg(long, env = "GATHERLY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds. Overrides the configured timeout.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The raw result envelope as JSON.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Event lookup and management.
    Events(events::EventsCommand),
    /// Guest lists and memberships.
    Guests(guests::GuestsCommand),
    /// Event announcements.
    Announcements(announcements::AnnouncementsCommand),
}

impl Commands {
    /// Runs the command against `layer` and formats its outcome.
    pub async fn run(self, layer: &DataLayer, format: OutputFormat) -> Rendered {
        match self {
            Commands::Events(command) => command.run(layer, format).await,
            Commands::Guests(command) => command.run(layer, format).await,
            Commands::Announcements(command) => command.run(layer, format).await,
        }
    }
}

/// Parses a `name=value` filter argument.
pub(crate) fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {:?}", raw)),
    }
}
