//! Event CLI commands.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use gatherly::DataLayer;
use gatherly_core::models::{CreateEventInput, ListEventsQuery, UpdateEventInput};

pub use gatherly_core::models::Visibility as CoreVisibility;

use super::{parse_filter, OutputFormat};
use crate::output::{format_output, pretty, Rendered};

/// Event commands.
#[derive(Debug, Parser)]
pub struct EventsCommand {
    #[command(subcommand)]
    pub action: EventsAction,
}

/// CLI visibility (with clap ValueEnum).
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Visibility {
    Public,
    Private,
}

impl From<Visibility> for CoreVisibility {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::Public => CoreVisibility::Public,
            Visibility::Private => CoreVisibility::Private,
        }
    }
}

/// Pagination and filters shared by every listing.
#[derive(Debug, Clone, clap::Args)]
pub struct ListArgs {
    /// Maximum number of events.
    #[arg(long, default_value_t = ListEventsQuery::DEFAULT_LIMIT)]
    pub limit: u32,
    /// Number of events to skip.
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
    /// Extra filter as NAME=VALUE. Repeatable.
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
}

impl From<ListArgs> for ListEventsQuery {
    fn from(args: ListArgs) -> Self {
        args.filters.into_iter().fold(
            ListEventsQuery::default()
                .with_limit(args.limit)
                .with_offset(args.offset),
            |query, (name, value)| query.with_filter(name, value),
        )
    }
}

/// Available event actions.
#[derive(Debug, Subcommand)]
pub enum EventsAction {
    /// Get an event by ID.
    Get {
        /// Event ID.
        id: String,
    },
    /// Look up an event by its share code.
    Code {
        /// Share code, e.g. ABC123.
        code: String,
    },
    /// List public events.
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    /// List events running right now.
    HappeningNow {
        #[command(flatten)]
        list: ListArgs,
    },
    /// List events you host.
    Managed {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Create a new event.
    Create {
        /// Event title.
        #[arg(long)]
        title: String,
        /// Start time (RFC 3339).
        #[arg(long)]
        starts_at: DateTime<Utc>,
        /// End time (RFC 3339).
        #[arg(long)]
        ends_at: Option<DateTime<Utc>>,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
        /// Optional location.
        #[arg(long)]
        location: Option<String>,
        /// Who can discover the event.
        #[arg(long, value_enum, default_value = "public")]
        visibility: Visibility,
    },
    /// Update an event. Only the given fields change.
    Update {
        /// Event ID.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        starts_at: Option<DateTime<Utc>>,
        #[arg(long)]
        ends_at: Option<DateTime<Utc>>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_enum)]
        visibility: Option<Visibility>,
    },
    /// Delete an event.
    Delete {
        /// Event ID.
        id: String,
    },
}

impl EventsCommand {
    pub async fn run(self, layer: &DataLayer, format: OutputFormat) -> Rendered {
        let events = layer.events();
        match self.action {
            EventsAction::Get { id } => {
                format_output(&events.get_by_id(&id).await, format, pretty::format_event)
            }
            EventsAction::Code { code } => {
                format_output(&events.get_by_code(&code).await, format, pretty::format_event)
            }
            EventsAction::List { list } => format_output(
                &events.list_public(&list.into()).await,
                format,
                |found| pretty::format_events(found),
            ),
            EventsAction::HappeningNow { list } => format_output(
                &events.list_happening_now(&list.into()).await,
                format,
                |found| pretty::format_events(found),
            ),
            EventsAction::Managed { list } => format_output(
                &events.list_managed(&list.into()).await,
                format,
                |found| pretty::format_events(found),
            ),
            EventsAction::Create {
                title,
                starts_at,
                ends_at,
                description,
                location,
                visibility,
            } => {
                let input = CreateEventInput {
                    ends_at,
                    description,
                    location,
                    visibility: visibility.into(),
                    ..CreateEventInput::new(title, starts_at)
                };
                format_output(&events.create(&input).await, format, pretty::format_event)
            }
            EventsAction::Update {
                id,
                title,
                starts_at,
                ends_at,
                description,
                location,
                visibility,
            } => {
                let input = UpdateEventInput {
                    title,
                    starts_at,
                    ends_at,
                    description,
                    location,
                    visibility: visibility.map(Into::into),
                };
                if input.is_empty() {
                    return Rendered::Failure("Nothing to update.".to_string());
                }
                format_output(&events.update(&id, &input).await, format, pretty::format_event)
            }
            EventsAction::Delete { id } => format_output(
                &events.delete(&id).await,
                format,
                |_| format!("Deleted event {}.", id),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};

    fn parse(args: &[&str]) -> EventsAction {
        let cli = Cli::try_parse_from(["gatherly", "events"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Events(command) => command.action,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_list_builds_query() {
        let EventsAction::List { list } = parse(&[
            "list",
            "--limit",
            "5",
            "--filter",
            "city=Oslo",
            "--filter",
            "tag=music",
        ]) else {
            panic!("expected list");
        };

        let query: ListEventsQuery = list.into();
        assert_eq!(query.limit, 5);
        assert_eq!(query.offset, 0);
        assert_eq!(query.filters.get("city").map(String::as_str), Some("Oslo"));
        assert_eq!(query.filters.len(), 2);
    }

    #[test]
    fn test_create_parses_timestamps() {
        let EventsAction::Create {
            starts_at,
            visibility,
            ..
        } = parse(&[
            "create",
            "--title",
            "Rooftop party",
            "--starts-at",
            "2026-06-01T18:00:00Z",
        ])
        else {
            panic!("expected create");
        };

        assert_eq!(starts_at.to_rfc3339(), "2026-06-01T18:00:00+00:00");
        assert!(matches!(visibility, Visibility::Public));
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let parsed = Cli::try_parse_from(["gatherly", "events", "list", "--filter", "oops"]);
        assert!(parsed.is_err());
    }
}
